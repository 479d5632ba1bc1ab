/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` from a read-only `Scene`
///   2. Compare each cell with `back` (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// While composing, clickable regions are recorded as hit targets so the
/// main loop can map mouse clicks back to operations. Later (higher)
/// layers win.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::{CardText, EasterEggConfig};
use crate::domain::confetti::ConfettiBurst;
use crate::domain::motes::Mote;
use crate::sim::state::{Phase, PresentationState};
use super::frame::{dim, lerp, rgb, str_width, Cell, FrameBuffer, Rect};

// ── Palette ──

const C_BG_TOP: Color = Color::Rgb { r: 15, g: 15, b: 17 };
const C_BG_MID: Color = Color::Rgb { r: 42, g: 10, b: 10 };
const C_BG_BOTTOM: Color = Color::Rgb { r: 26, g: 5, b: 5 };
const C_ENVELOPE: Color = Color::Rgb { r: 185, g: 28, b: 28 };
const C_FLAP: Color = Color::Rgb { r: 153, g: 27, b: 27 };
const C_ENVELOPE_EDGE: Color = Color::Rgb { r: 248, g: 113, b: 113 };
const C_GOLD: Color = Color::Rgb { r: 245, g: 158, b: 11 };
const C_GOLD_LIGHT: Color = Color::Rgb { r: 252, g: 211, b: 77 };
const C_GOLD_DARK: Color = Color::Rgb { r: 120, g: 53, b: 15 };
const C_PALE_YELLOW: Color = Color::Rgb { r: 254, g: 240, b: 138 };
const C_CARD: Color = Color::Rgb { r: 255, g: 252, b: 245 };
const C_CARD_EDGE: Color = Color::Rgb { r: 212, g: 175, b: 55 };
const C_VIDEO_BG: Color = Color::Rgb { r: 254, g: 242, b: 242 };
const C_BADGE: Color = Color::Rgb { r: 220, g: 38, b: 38 };
const C_HEADING: Color = Color::Rgb { r: 139, g: 0, b: 0 };
const C_RULE: Color = Color::Rgb { r: 184, g: 134, b: 11 };
const C_BODY: Color = Color::Rgb { r: 92, g: 58, b: 58 };
const C_SIGNATURE: Color = Color::Rgb { r: 156, g: 163, b: 175 };
const C_SIGNATURE_HOVER: Color = Color::Rgb { r: 75, g: 85, b: 99 };
const C_COUNTER: Color = Color::Rgb { r: 248, g: 113, b: 113 };
const C_ORANGE: Color = Color::Rgb { r: 249, g: 115, b: 22 };
const C_WHITE: Color = Color::Rgb { r: 255, g: 255, b: 255 };
const C_BLACK: Color = Color::Rgb { r: 0, g: 0, b: 0 };
const C_HELP: Color = Color::Rgb { r: 120, g: 100, b: 100 };

const ENVELOPE_W: usize = 30;
const ENVELOPE_H: usize = 18;
const CARD_W: usize = 40;
const CARD_H: usize = 24;

/// Card slide-in after opening.
const CARD_RISE_MS: u64 = 600;

/// Clickable regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Envelope,
    PlayButton,
    Signature,
    MusicButton,
    OverlayBackdrop,
    OverlayPanel,
    OverlayClose,
}

/// Everything a frame needs, borrowed from the main loop.
pub struct Scene<'a> {
    pub state: &'a PresentationState,
    pub text: &'a CardText,
    pub easter_egg: &'a EasterEggConfig,
    pub confetti: Option<&'a ConfettiBurst>,
    pub motes: &'a [Mote],
    /// Milliseconds since start-up; drives ambient animation.
    pub elapsed_ms: u64,
    /// Milliseconds since the envelope opened.
    pub since_open_ms: Option<u64>,
    pub video_progress: Option<f32>,
    pub hover: Option<(u16, u16)>,
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    hits: Vec<(Rect, Target)>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            hits: Vec::new(),
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Topmost target under a terminal cell.
    pub fn hit_test(&self, col: u16, row: u16) -> Option<Target> {
        self.hits
            .iter()
            .rev()
            .find(|(r, _)| r.contains(col as usize, row as usize))
            .map(|(_, t)| *t)
    }

    pub fn render(&mut self, scene: &Scene) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Phase change → clean transition
        if self.last_phase != Some(scene.state.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(scene.state.phase);
        }

        self.compose(scene);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    /// Build the front buffer and hit regions for `scene`.
    fn compose(&mut self, scene: &Scene) {
        self.front.clear();
        self.hits.clear();

        self.compose_background(scene);
        match scene.state.phase {
            Phase::Closed => self.compose_envelope(scene),
            Phase::Open => {
                self.compose_card(scene);
                self.compose_music_button(scene);
            }
        }
        if scene.state.easter_egg_visible {
            self.compose_easter_egg(scene);
        }
        if let Some(burst) = scene.confetti {
            self.compose_confetti(burst);
        }
        if scene.state.achievement_visible {
            self.compose_achievement(scene);
        }
        self.compose_help(scene);
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colours; ResetColor would fall back to the
        // terminal's own default and leave seams.
        queue!(self.writer,
            SetForegroundColor(last_fg),
            SetBackgroundColor(last_bg),
        )?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                if cell.cont {
                    x += 1;
                    continue;
                }

                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);
                if cell == self.back.get(x, y) && !cont_changed {
                    x += 1;
                    continue;
                }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.as_str()))?;

                let step = if cell.wide { 2 } else { 1 };
                x += step;
                cursor_at = Some((x, y));
            }
        }

        self.writer.flush()
    }

    // ── Layers ──

    fn compose_background(&mut self, scene: &Scene) {
        let (w, h) = (self.front.width, self.front.height);
        for y in 0..h {
            // Top → middle → bottom gradient
            let t = y as f32 / h.max(1) as f32;
            let bg = if t < 0.5 {
                lerp(C_BG_TOP, C_BG_MID, t * 2.0)
            } else {
                lerp(C_BG_MID, C_BG_BOTTOM, (t - 0.5) * 2.0)
            };
            self.front.fill_rect(Rect::new(0, y, w, 1), bg);
        }

        for mote in scene.motes {
            let pos = match mote.at(scene.elapsed_ms) {
                Some(p) => p,
                None => continue,
            };
            if !(0.0..1.0).contains(&pos.y) { continue; }
            let col = (pos.x * w as f32) as usize;
            let row = (pos.y * h as f32) as usize;
            let bg = self.front.bg_at(col, row);
            let glyph = if pos.large { '•' } else { '·' };
            self.front.put_char(col, row, glyph, lerp(bg, C_GOLD, pos.opacity * 0.5));
        }
    }

    fn stage(&self) -> Rect {
        // Bottom row is the help line.
        Rect::new(0, 0, self.front.width, self.front.height.saturating_sub(1))
    }

    fn compose_envelope(&mut self, scene: &Scene) {
        let env = Rect::centered_in(self.stage(), ENVELOPE_W, ENVELOPE_H);
        if env.w < 8 || env.h < 6 { return; }
        let hovered = scene
            .hover
            .map_or(false, |(c, r)| env.contains(c as usize, r as usize));

        self.front.fill_rect(env, C_ENVELOPE);

        // Flap: a shallow curve darker than the body.
        let flap_depth = env.h * 2 / 5;
        for row in 0..flap_depth {
            let y = env.y + row;
            let progress = row as f32 / flap_depth.max(1) as f32;
            let half = ((1.0 - progress * progress) * env.w as f32 / 2.0) as usize;
            let mid = env.x + env.w / 2;
            let from = mid.saturating_sub(half).max(env.x);
            let to = (mid + half).min(env.right());
            self.front.fill_rect(Rect::new(from, y, to - from, 1), C_FLAP);
        }
        self.front.draw_border(env, lerp(C_ENVELOPE, C_ENVELOPE_EDGE, 0.6));

        // "开" seal
        let seal_y = env.y + flap_depth.saturating_sub(1);
        let seal = Rect::new(env.x + env.w / 2 - 4, seal_y, 8, 3);
        let seal_bg = if hovered { C_GOLD_LIGHT } else { C_GOLD };
        self.front.fill_rect(seal, seal_bg);
        self.front.draw_border(seal, C_PALE_YELLOW);
        let label = if hovered { "◆开◆" } else { " 开 " };
        self.front.put_centered(seal.x, seal.w, seal.y + 1, label, C_GOLD_DARK, None);

        // Pulsing prompt, 2 s cycle
        let phase = (scene.elapsed_ms % 2000) as f32 / 2000.0;
        let pulse = 0.6 + 0.4 * (1.0 - (phase * 2.0 - 1.0).abs());
        let prompt_fg = lerp(C_ENVELOPE, C_PALE_YELLOW, pulse);
        self.front.put_centered(env.x, env.w, seal.bottom() + 2, "C L I C K  T O  O P E N", prompt_fg, None);

        // Shadowed lower half
        for y in env.y + env.h * 3 / 4..env.bottom().saturating_sub(1) {
            for x in env.x + 1..env.right() - 1 {
                let bg = self.front.bg_at(x, y);
                self.front.put_str(x, y, " ", C_WHITE, Some(dim(bg, 0.8)));
            }
        }

        self.hits.push((env, Target::Envelope));
    }

    fn compose_card(&mut self, scene: &Scene) {
        let stage = self.stage();
        let mut card = Rect::centered_in(stage, CARD_W, CARD_H);
        if card.w < 12 || card.h < 10 { return; }

        // Slide up from below while opening
        if let Some(t) = scene.since_open_ms {
            if t < CARD_RISE_MS {
                let p = t as f32 / CARD_RISE_MS as f32;
                let ease = 1.0 - (1.0 - p).powi(3);
                let offset = ((1.0 - ease) * stage.h as f32 / 2.0) as usize;
                card.y += offset;
            }
        }

        self.front.fill_rect(card, C_CARD);

        let video_h = card.h * 3 / 5;
        let video = Rect::new(card.x + 1, card.y + 1, card.w - 2, video_h.saturating_sub(1));
        self.compose_video_area(scene, video);

        let text_top = card.y + video_h;
        self.compose_card_text(scene, card, text_top);

        self.front.draw_border(card, C_CARD_EDGE);
    }

    fn compose_video_area(&mut self, scene: &Scene, area: Rect) {
        self.front.fill_rect(area, C_VIDEO_BG);
        let state = scene.state;
        let item = match &state.selected {
            Some(item) => item,
            None => return,
        };

        if state.video_playing {
            self.compose_video_frames(scene, area);
        } else {
            // Placeholder behind the play button
            self.front.put_centered(area.x, area.w, area.bottom().saturating_sub(2), "🎬", C_BADGE, None);

            let button = Rect::new(area.x + area.w / 2 - 4, area.y + area.h / 2 - 1, 8, 3);
            self.front.fill_rect(button, C_WHITE);
            self.front.draw_border(button, lerp(C_WHITE, C_BADGE, 0.3));
            self.front.put_centered(button.x, button.w, button.y + 1, "▶", C_BADGE, None);
            self.hits.push((button, Target::PlayButton));
        }

        // Title badge, fades in after the card lands
        if scene.since_open_ms.map_or(true, |t| t >= 500) {
            let badge = format!(" 🎊 {} ", item.title);
            let bw = str_width(&badge);
            let bx = area.x + area.w.saturating_sub(bw) / 2;
            self.front.put_str(bx, area.y + 1, &badge, C_WHITE, Some(C_BADGE));
        }
    }

    /// In-terminal playback: horses galloping across the frame.
    fn compose_video_frames(&mut self, scene: &Scene, area: Rect) {
        let film = lerp(C_BADGE, C_BLACK, 0.6);
        self.front.fill_rect(area, film);

        let t = scene.elapsed_ms;
        let lanes = area.h.saturating_sub(4).max(1);
        for lane in 0..lanes {
            let speed = 12 + (lane as u64 * 7) % 11;
            let span = area.w as u64 + 4;
            let x = ((t / speed + lane as u64 * 13) % span) as usize;
            let col = area.x + x.min(area.w.saturating_sub(2));
            self.front.put_str(col, area.y + 3 + lane, "🐎", C_WHITE, None);
        }

        let bar_y = area.bottom().saturating_sub(1);
        match scene.video_progress {
            Some(p) => {
                let bar_w = area.w.saturating_sub(10);
                let filled = (p * bar_w as f32) as usize;
                self.front.put_str(area.x + 1, bar_y, "▶", C_GOLD_LIGHT, None);
                for i in 0..bar_w {
                    let (ch, fg) = if i < filled { ('━', C_GOLD) } else { ('─', C_SIGNATURE) };
                    self.front.put_char(area.x + 3 + i, bar_y, ch, fg);
                }
                let pct = format!("{:>3}%", (p * 100.0) as u32);
                self.front.put_str(area.right().saturating_sub(5), bar_y, &pct, C_WHITE, None);
            }
            None => {
                let dots = ".".repeat(((t / 400) % 4) as usize);
                let label = format!("▶ 正在播放{dots}");
                self.front.put_str(area.x + 1, bar_y, &label, C_GOLD_LIGHT, None);
            }
        }
    }

    fn compose_card_text(&mut self, scene: &Scene, card: Rect, top: usize) {
        let text = scene.text;
        let (x0, w) = (card.x + 1, card.w - 2);
        let visible = scene.since_open_ms.map_or(true, |t| t >= 500);

        let mut y = top + 1;
        if visible {
            self.front.put_centered(x0, w, y, &text.heading, C_HEADING, None);
            y += 1;
            self.front.put_centered(x0, w, y, "━━━━━━", C_RULE, None);
            y += 1;
            self.front.put_centered(x0, w, y, &text.subtitle, C_BODY, None);
            y += 1;
            for line in &text.lines {
                if y + 1 >= card.bottom().saturating_sub(1) { break; }
                self.front.put_centered(x0, w, y, line, lerp(C_CARD, C_BODY, 0.8), None);
                y += 1;
            }
        }

        // Signature: the easter-egg trigger
        let sig_y = card.bottom().saturating_sub(2);
        if sig_y <= top || scene.since_open_ms.map_or(false, |t| t < 1000) {
            return;
        }
        let label = scene.state.click_label(scene.easter_egg_threshold());
        let sig_w = str_width(&text.signature)
            + label.as_ref().map_or(0, |l| str_width(l) + 1);
        let sig_x = x0 + w.saturating_sub(sig_w) / 2;
        let sig = Rect::new(sig_x, sig_y, sig_w.min(w), 1);
        let hovered = scene.hover.map_or(false, |(c, r)| sig.contains(c as usize, r as usize));
        let fg = if hovered { C_SIGNATURE_HOVER } else { C_SIGNATURE };
        let n = self.front.put_str(sig_x, sig_y, &text.signature, fg, None);
        if let Some(l) = label {
            self.front.put_str(sig_x + n + 1, sig_y, &l, C_COUNTER, None);
        }
        self.hits.push((sig, Target::Signature));
    }

    fn compose_music_button(&mut self, scene: &Scene) {
        let (w, h) = (self.front.width, self.front.height);
        if w < 12 || h < 6 { return; }
        let button = Rect::new(w - 10, h - 5, 8, 3);
        self.front.fill_rect(button, lerp(C_BADGE, C_ORANGE, 0.4));

        if scene.state.music_playing {
            // Ripple every 1.5 s
            let ring = (scene.elapsed_ms % 1500) < 750;
            let edge = if ring { C_WHITE } else { C_PALE_YELLOW };
            self.front.draw_border(button, edge);
            self.front.put_centered(button.x, button.w, button.y + 1, "♫", C_WHITE, None);
        } else {
            self.front.draw_border(button, lerp(C_PALE_YELLOW, C_BADGE, 0.5));
            self.front.put_centered(button.x, button.w, button.y + 1, "♪×", dim(C_WHITE, 0.7), None);
        }
        self.hits.push((button, Target::MusicButton));
    }

    fn compose_achievement(&mut self, scene: &Scene) {
        let text = scene.text;
        let body_w = str_width(&text.achievement_body);
        let bw = (body_w + 10).max(24).min(self.front.width.saturating_sub(2));
        if bw < 10 || self.front.height < 6 { return; }
        let banner = Rect::new(self.front.width - bw - 1, 1, bw, 4);

        for x in banner.x..banner.right() {
            let t = (x - banner.x) as f32 / bw as f32;
            self.front.fill_rect(Rect::new(x, banner.y, 1, banner.h), lerp(C_GOLD_LIGHT, C_ORANGE, t));
        }
        self.front.draw_border(banner, C_PALE_YELLOW);
        self.front.put_str(banner.x + 2, banner.y + 1, "🏆", C_WHITE, None);
        self.front.put_str(banner.x + 5, banner.y + 1, &text.achievement_title, C_WHITE, None);
        self.front.put_str(banner.x + 5, banner.y + 2, &text.achievement_body, C_WHITE, None);
    }

    fn compose_easter_egg(&mut self, scene: &Scene) {
        self.front.dim_all(0.2);
        let full = self.front.bounds();
        self.hits.push((full, Target::OverlayBackdrop));

        let pw = (self.front.width * 9 / 10).min(60);
        // 16:9, terminal cells roughly twice as tall as wide
        let ph = (pw * 9 / 32).max(7);
        let panel = Rect::centered_in(self.stage(), pw, ph);
        if panel.w < 16 || panel.h < 5 { return; }
        self.front.fill_rect(panel, C_BLACK);
        self.front.draw_border(panel, C_GOLD_LIGHT);
        self.hits.push((panel, Target::OverlayPanel));

        let title = format!(" 🎉 {} ", scene.text.easter_egg_title);
        self.front.put_str(panel.x + 2, panel.y + 1, &title, C_WHITE, Some(C_ORANGE));

        let close = Rect::new(panel.right() - 6, panel.y + 1, 3, 1);
        self.front.put_str(close.x, close.y, " ✕ ", C_BLACK, Some(C_WHITE));
        self.hits.push((close, Target::OverlayClose));

        // The embed itself lives outside the terminal; show where.
        let inner_w = panel.w - 4;
        let mut y = panel.y + 3;
        self.front.put_centered(panel.x + 2, inner_w, y, "▶", C_GOLD_LIGHT, None);
        y += 2;
        let url = &scene.easter_egg.embed_url;
        let chars: Vec<char> = url.chars().collect();
        for chunk in chars.chunks(inner_w.max(1)) {
            if y >= panel.bottom() - 1 { break; }
            let line: String = chunk.iter().collect();
            self.front.put_centered(panel.x + 2, inner_w, y, &line, C_SIGNATURE, None);
            y += 1;
        }
    }

    fn compose_confetti(&mut self, burst: &ConfettiBurst) {
        let (w, h) = (self.front.width as f32, self.front.height as f32);
        for p in burst.particles() {
            if !(0.0..1.0).contains(&p.x) || !(0.0..1.0).contains(&p.y) { continue; }
            let col = (p.x * w) as usize;
            let row = (p.y * h) as usize;
            let bg = self.front.bg_at(col, row);
            self.front.put_char(col, row, p.glyph, lerp(bg, rgb(p.color), p.opacity()));
        }
    }

    fn compose_help(&mut self, scene: &Scene) {
        let y = self.front.height.saturating_sub(1);
        let state = scene.state;
        let help = if state.easter_egg_visible {
            "[Esc] 关闭彩蛋  [Q] 退出"
        } else if state.phase == Phase::Closed {
            "[Enter] 开红包  [Q] 退出"
        } else if state.easter_egg_unlocked {
            "[Enter] 播放  [M] 音乐  [E] 彩蛋  [Q] 退出"
        } else {
            "[Enter] 播放  [M] 音乐  [Q] 退出"
        };
        let w = self.front.width;
        self.front.put_centered(0, w, y, help, C_HELP, None);
    }
}

impl Scene<'_> {
    fn easter_egg_threshold(&self) -> u32 {
        self.easter_egg.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CardConfig;
    use crate::domain::blessing::BlessingItem;

    fn renderer(w: usize, h: usize) -> Renderer {
        let mut r = Renderer::new();
        r.front.resize(w, h);
        r.back.resize(w, h);
        r
    }

    fn scene<'a>(state: &'a PresentationState, cfg: &'a CardConfig) -> Scene<'a> {
        Scene {
            state,
            text: &cfg.text,
            easter_egg: &cfg.easter_egg,
            confetti: None,
            motes: &[],
            elapsed_ms: 5_000,
            since_open_ms: Some(5_000),
            video_progress: None,
            hover: None,
        }
    }

    fn opened() -> PresentationState {
        let mut s = PresentationState::new();
        s.phase = Phase::Open;
        s.selected = Some(BlessingItem::new("/blessing3.mp4", "万事如意"));
        s
    }

    fn row_text(fb: &FrameBuffer, y: usize) -> String {
        (0..fb.width)
            .map(|x| fb.get(x, y))
            .filter(|c| !c.cont)
            .map(|c| c.as_str().to_string())
            .collect()
    }

    fn screen_text(fb: &FrameBuffer) -> String {
        (0..fb.height).map(|y| row_text(fb, y)).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn closed_envelope_is_clickable() {
        let cfg = CardConfig::default();
        let state = PresentationState::new();
        let mut r = renderer(80, 30);
        r.compose(&scene(&state, &cfg));

        assert_eq!(r.hit_test(40, 15), Some(Target::Envelope));
        assert_eq!(r.hit_test(0, 0), None);
        assert!(screen_text(&r.front).contains("开"));
    }

    #[test]
    fn open_card_shows_title_and_targets() {
        let cfg = CardConfig::default();
        let state = opened();
        let mut r = renderer(80, 30);
        r.compose(&scene(&state, &cfg));

        let text = screen_text(&r.front);
        assert!(text.contains("万事如意"));
        assert!(text.contains("二〇二六"));
        let targets: Vec<Target> = r.hits.iter().map(|(_, t)| *t).collect();
        assert!(targets.contains(&Target::PlayButton));
        assert!(targets.contains(&Target::Signature));
        assert!(targets.contains(&Target::MusicButton));
        assert!(!targets.contains(&Target::Envelope));
    }

    #[test]
    fn playing_video_hides_play_button() {
        let cfg = CardConfig::default();
        let mut state = opened();
        state.video_playing = true;
        let mut r = renderer(80, 30);
        let mut sc = scene(&state, &cfg);
        sc.video_progress = Some(0.5);
        r.compose(&sc);
        assert!(r.hits.iter().all(|(_, t)| *t != Target::PlayButton));
        assert!(screen_text(&r.front).contains("50%"));
    }

    #[test]
    fn click_counter_appears_then_clamps() {
        let cfg = CardConfig::default();
        let mut state = opened();
        state.click_count = 3;
        let mut r = renderer(80, 30);
        r.compose(&scene(&state, &cfg));
        assert!(screen_text(&r.front).contains("(3/5)"));

        state.click_count = 6;
        r.compose(&scene(&state, &cfg));
        assert!(!screen_text(&r.front).contains("/5)"));
    }

    #[test]
    fn overlay_sits_above_card() {
        let cfg = CardConfig::default();
        let mut state = opened();
        state.easter_egg_unlocked = true;
        state.easter_egg_visible = true;
        let mut r = renderer(80, 30);
        r.compose(&scene(&state, &cfg));

        // Corner is backdrop, centre is the panel, not the card beneath.
        assert_eq!(r.hit_test(0, 0), Some(Target::OverlayBackdrop));
        assert_eq!(r.hit_test(40, 14), Some(Target::OverlayPanel));
        let close = r.hits.iter().find(|(_, t)| *t == Target::OverlayClose).unwrap().0;
        assert_eq!(r.hit_test(close.x as u16, close.y as u16), Some(Target::OverlayClose));
        assert!(screen_text(&r.front).contains("隐藏彩蛋"));
    }

    #[test]
    fn achievement_banner_rendered_when_visible() {
        let cfg = CardConfig::default();
        let mut state = opened();
        state.achievement_visible = true;
        let mut r = renderer(100, 30);
        r.compose(&scene(&state, &cfg));
        assert!(screen_text(&r.front).contains("成就解锁"));
    }

    #[test]
    fn tiny_terminal_does_not_panic() {
        let cfg = CardConfig::default();
        let state = opened();
        let mut r = renderer(5, 3);
        r.compose(&scene(&state, &cfg));
        let closed = PresentationState::new();
        r.compose(&scene(&closed, &cfg));
    }
}
