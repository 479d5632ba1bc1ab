/// PresentationState: everything the card remembers during one session.
///
/// One flat record, created with defaults at start-up and dropped on exit.
/// Only `sim::step` mutates it; the renderer reads it.
///
/// Invariants kept by the transition function:
///   - `selected.is_some()` exactly when `phase == Open`
///   - `video_playing` and `music_playing` are never both true
///   - `easter_egg_unlocked` never goes back to false

use crate::domain::blessing::BlessingItem;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Closed,
    Open,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresentationState {
    pub phase: Phase,
    pub selected: Option<BlessingItem>,
    pub video_playing: bool,
    pub music_playing: bool,
    pub click_count: u32,
    pub easter_egg_unlocked: bool,
    pub easter_egg_visible: bool,
    pub achievement_visible: bool,
    /// Controller torn down: every later event is ignored.
    pub disposed: bool,
}

impl PresentationState {
    pub fn new() -> Self {
        PresentationState {
            phase: Phase::Closed,
            selected: None,
            video_playing: false,
            music_playing: false,
            click_count: 0,
            easter_egg_unlocked: false,
            easter_egg_visible: false,
            achievement_visible: false,
            disposed: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.phase == Phase::Open
    }

    /// Counter shown beside the signature: `(n/threshold)` while counting,
    /// nothing before the first click or once the threshold is reached.
    pub fn click_label(&self, threshold: u32) -> Option<String> {
        if self.click_count > 0 && self.click_count < threshold {
            Some(format!("({}/{})", self.click_count, threshold))
        } else {
            None
        }
    }
}

impl Default for PresentationState {
    fn default() -> Self {
        Self::new()
    }
}
