/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete;
/// an empty `[[blessing]]` list falls back to the stock pool.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::blessing::{BlessingItem, BlessingPool};
use crate::error::ConfigError;
use crate::sim::step::StepRules;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct CardConfig {
    pub timing: TimingConfig,
    pub easter_egg: EasterEggConfig,
    pub media: MediaConfig,
    pub text: CardText,
    pub gamepad: GamepadConfig,
    pub pool: BlessingPool,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub music_delay_ms: u64,
    pub achievement_ms: u64,
    pub confetti_ms: u64,
}

#[derive(Clone, Debug)]
pub struct EasterEggConfig {
    pub threshold: u32,
    pub embed_url: String,
}

#[derive(Clone, Debug)]
pub struct MediaConfig {
    pub assets_dir: PathBuf,
    pub background_music: Vec<String>,
    pub video_player: String,
    pub video_duration: Duration,
}

#[derive(Clone, Debug)]
pub struct CardText {
    pub heading: String,
    pub subtitle: String,
    pub lines: Vec<String>,
    pub signature: String,
    pub achievement_title: String,
    pub achievement_body: String,
    pub easter_egg_title: String,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub music: Vec<String>,
    pub sign: Vec<String>,
    pub cancel: Vec<String>,
}

impl CardConfig {
    pub fn step_rules(&self) -> StepRules {
        StepRules {
            music_delay_ms: self.timing.music_delay_ms,
            achievement_ms: self.timing.achievement_ms,
            easter_egg_threshold: self.easter_egg.threshold,
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    easter_egg: TomlEasterEgg,
    #[serde(default)]
    media: TomlMedia,
    #[serde(default)]
    card: TomlCard,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    blessing: Vec<TomlBlessing>,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_music_delay")]
    music_delay_ms: u64,
    #[serde(default = "default_achievement")]
    achievement_ms: u64,
    #[serde(default = "default_confetti")]
    confetti_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlEasterEgg {
    #[serde(default = "default_threshold")]
    threshold: u32,
    #[serde(default = "default_embed_url")]
    embed_url: String,
}

#[derive(Deserialize, Debug)]
struct TomlMedia {
    #[serde(default = "default_assets_dir")]
    assets_dir: String,
    #[serde(default = "default_background_music")]
    background_music: Vec<String>,
    #[serde(default)]
    video_player: String,
    #[serde(default = "default_video_duration")]
    video_duration_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlCard {
    #[serde(default = "default_heading")]
    heading: String,
    #[serde(default = "default_subtitle")]
    subtitle: String,
    #[serde(default = "default_lines")]
    lines: Vec<String>,
    #[serde(default = "default_signature")]
    signature: String,
    #[serde(default = "default_achievement_title")]
    achievement_title: String,
    #[serde(default = "default_achievement_body")]
    achievement_body: String,
    #[serde(default = "default_easter_egg_title")]
    easter_egg_title: String,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_music")]
    music: Vec<String>,
    #[serde(default = "default_sign")]
    sign: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlBlessing {
    source: String,
    title: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 33 }
fn default_music_delay() -> u64 { 500 }
fn default_achievement() -> u64 { 3000 }
fn default_confetti() -> u64 { 3500 }

fn default_threshold() -> u32 { 5 }
fn default_embed_url() -> String {
    "//player.bilibili.com/player.html?isOutside=true&aid=116070232950325\
     &bvid=BV1tTZEBCEBF&cid=36067806342&p=1&autoplay=1".into()
}

fn default_assets_dir() -> String { "public".into() }
fn default_background_music() -> Vec<String> {
    vec!["background-music.mp3".into(), "background-music.ogg".into()]
}
fn default_video_duration() -> u64 { 8000 }

fn default_heading() -> String { "二〇二六".into() }
fn default_subtitle() -> String { "马到功成 · 万马奔腾".into() }
fn default_lines() -> Vec<String> {
    vec![
        "愿你的身体如骏马般强健".into(),
        "愿你的生活如草原般辽阔".into(),
        "除夕快乐，岁岁平安！".into(),
    ]
}
fn default_signature() -> String { "Generated by Deepseek & Liu".into() }
fn default_achievement_title() -> String { "成就解锁！".into() }
fn default_achievement_body() -> String { "你发现了隐藏彩蛋，你是真的很闲￣へ￣".into() }
fn default_easter_egg_title() -> String { "隐藏彩蛋".into() }

fn default_confirm() -> Vec<String> { vec!["A".into(), "Start".into()] }
fn default_music() -> Vec<String> { vec!["Y".into()] }
fn default_sign() -> Vec<String> { vec!["X".into()] }
fn default_cancel() -> Vec<String> { vec!["B".into(), "Select".into()] }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            music_delay_ms: default_music_delay(),
            achievement_ms: default_achievement(),
            confetti_ms: default_confetti(),
        }
    }
}

impl Default for TomlEasterEgg {
    fn default() -> Self {
        TomlEasterEgg {
            threshold: default_threshold(),
            embed_url: default_embed_url(),
        }
    }
}

impl Default for TomlMedia {
    fn default() -> Self {
        TomlMedia {
            assets_dir: default_assets_dir(),
            background_music: default_background_music(),
            video_player: String::new(),
            video_duration_ms: default_video_duration(),
        }
    }
}

impl Default for TomlCard {
    fn default() -> Self {
        TomlCard {
            heading: default_heading(),
            subtitle: default_subtitle(),
            lines: default_lines(),
            signature: default_signature(),
            achievement_title: default_achievement_title(),
            achievement_body: default_achievement_body(),
            easter_egg_title: default_easter_egg_title(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            music: default_music(),
            sign: default_sign(),
            cancel: default_cancel(),
        }
    }
}

// ── Loading ──

impl CardConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = match find_config(&search_dirs) {
            Some(path) => match read_toml(&path) {
                Ok(cfg) => {
                    info!(path = %path.display(), "config loaded");
                    cfg
                }
                Err(e) => {
                    warn!(error = %e, "using default settings");
                    TomlConfig::default()
                }
            },
            None => {
                info!("no config.toml found, using default settings");
                TomlConfig::default()
            }
        };
        Self::from_toml(toml_cfg, &search_dirs)
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let items: Vec<BlessingItem> = cfg.blessing
            .into_iter()
            .map(|b| BlessingItem::new(b.source, b.title))
            .collect();
        let pool = if items.is_empty() {
            warn!("no [[blessing]] entries, using the built-in pool");
            BlessingPool::builtin()
        } else {
            // Non-empty by construction.
            BlessingPool::new(items).unwrap_or_default()
        };

        let mut threshold = cfg.easter_egg.threshold;
        if threshold == 0 {
            warn!("easter_egg.threshold must be at least 1, using default");
            threshold = default_threshold();
        }

        CardConfig {
            timing: TimingConfig {
                tick_rate_ms: cfg.timing.tick_rate_ms.max(1),
                music_delay_ms: cfg.timing.music_delay_ms,
                achievement_ms: cfg.timing.achievement_ms,
                confetti_ms: cfg.timing.confetti_ms,
            },
            easter_egg: EasterEggConfig {
                threshold,
                embed_url: cfg.easter_egg.embed_url,
            },
            media: MediaConfig {
                assets_dir: resolve_dir(&cfg.media.assets_dir, search_dirs),
                background_music: cfg.media.background_music,
                video_player: cfg.media.video_player,
                video_duration: Duration::from_millis(cfg.media.video_duration_ms),
            },
            text: CardText {
                heading: cfg.card.heading,
                subtitle: cfg.card.subtitle,
                lines: cfg.card.lines,
                signature: cfg.card.signature,
                achievement_title: cfg.card.achievement_title,
                achievement_body: cfg.card.achievement_body,
                easter_egg_title: cfg.card.easter_egg_title,
            },
            gamepad: GamepadConfig {
                confirm: cfg.gamepad.confirm,
                music: cfg.gamepad.music,
                sign: cfg.gamepad.sign,
                cancel: cfg.gamepad.cancel,
            },
            pool,
        }
    }
}

impl Default for CardConfig {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), &[])
    }
}

/// Absolute paths are kept; relative ones are looked up in the candidate
/// directories, defaulting to CWD-relative.
fn resolve_dir(dir: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(dir);
    if path.is_absolute() {
        return path;
    }
    search_dirs.iter()
        .map(|d| d.join(dir))
        .find(|p| p.is_dir())
        .unwrap_or(path)
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn find_config(search_dirs: &[PathBuf]) -> Option<PathBuf> {
    search_dirs.iter()
        .map(|d| d.join("config.toml"))
        .find(|p| p.exists())
}

fn read_toml(path: &Path) -> Result<TomlConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_toml(&text)
}

fn parse_toml(text: &str) -> Result<TomlConfig, ConfigError> {
    Ok(toml::from_str::<TomlConfig>(text)?)
}
