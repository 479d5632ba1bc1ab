/// Foreground video channel.
///
/// Two backends:
///   - External player: when `media.video_player` is set (e.g. `mpv
///     --really-quiet`), the blessing file is handed to that command and the
///     end of playback is the child process exiting.
///   - In-terminal: otherwise playback is simulated for a fixed duration
///     and the renderer draws an animated frame strip from `progress()`.
///
/// Stop kills the player (or resets the clock); the next start is from the
/// beginning either way.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::MediaError;
use crate::media::MediaChannel;
use crate::sim::event::Channel;

enum Playback {
    Idle,
    External(Child),
    Simulated { started: Instant },
}

pub struct VideoChannel {
    player: Vec<String>,
    assets_dir: PathBuf,
    duration: Duration,
    playback: Playback,
}

impl VideoChannel {
    pub fn new(player_cmd: &str, assets_dir: &Path, duration: Duration) -> Self {
        VideoChannel {
            player: player_cmd.split_whitespace().map(str::to_string).collect(),
            assets_dir: assets_dir.to_path_buf(),
            duration,
            playback: Playback::Idle,
        }
    }

    fn resolve(&self, source: &str) -> PathBuf {
        self.assets_dir.join(source.trim_start_matches('/'))
    }

    fn spawn_player(&self, path: &Path) -> Result<Child, MediaError> {
        let (program, args) = match self.player.split_first() {
            Some(split) => split,
            None => return Err(MediaError::rejected(Channel::Video, "no player configured")),
        };
        if !path.is_file() {
            return Err(MediaError::rejected(
                Channel::Video,
                format!("{} not found", path.display()),
            ));
        }
        Command::new(program)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| MediaError::rejected(Channel::Video, format!("{program}: {e}")))
    }
}

impl MediaChannel for VideoChannel {
    fn start(&mut self, source: Option<&str>) -> Result<(), MediaError> {
        self.stop();
        let source = source.ok_or_else(|| MediaError::rejected(Channel::Video, "no source"))?;

        self.playback = if self.player.is_empty() {
            Playback::Simulated { started: Instant::now() }
        } else {
            let path = self.resolve(source);
            let child = self.spawn_player(&path)?;
            info!(path = %path.display(), "external video player started");
            Playback::External(child)
        };
        Ok(())
    }

    /// Video has no separate pause in this design; pausing ends playback.
    fn pause(&mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Playback::External(child) = &mut self.playback {
            if let Err(e) = child.kill() {
                warn!(error = %e, "could not stop video player");
            }
            let _ = child.wait();
        }
        self.playback = Playback::Idle;
    }

    fn poll_ended(&mut self) -> bool {
        let ended = match &mut self.playback {
            Playback::Idle => false,
            Playback::External(child) => match child.try_wait() {
                Ok(Some(_)) => true,
                Ok(None) => false,
                Err(e) => {
                    warn!(error = %e, "lost track of video player");
                    true
                }
            },
            Playback::Simulated { started } => started.elapsed() >= self.duration,
        };
        if ended {
            self.playback = Playback::Idle;
        }
        ended
    }

    fn is_active(&self) -> bool {
        !matches!(self.playback, Playback::Idle)
    }

    fn progress(&self) -> Option<f32> {
        match &self.playback {
            Playback::Simulated { started } if !self.duration.is_zero() => {
                Some((started.elapsed().as_secs_f32() / self.duration.as_secs_f32()).min(1.0))
            }
            _ => None,
        }
    }
}

impl Drop for VideoChannel {
    fn drop(&mut self) {
        self.stop();
    }
}
