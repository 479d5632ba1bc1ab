/// Events fed into the presentation state machine, and the effects it
/// asks the outside world to perform.
///
/// Events come from user input, media backends and the timer scheduler.
/// Effects go to the media coordinator, the renderer (confetti) and the
/// scheduler.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Audio,
    Video,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Audio => f.write_str("audio"),
            Channel::Video => f.write_str("video"),
        }
    }
}

/// Deferred events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Background music start shortly after the envelope opens.
    MusicStartDue,
    /// Hide the achievement banner.
    AchievementClear,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Open,
    PlayVideo,
    VideoEnded,
    ToggleMusic,
    EasterEggClick,
    CloseEasterEgg,
    ReopenEasterEgg,
    MediaRejected { channel: Channel, reason: String },
    Timer(TimerKind),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    StartAudio,
    PauseAudio,
    /// Pause and rewind to the start.
    StopAudio,
    StartVideo { source: String },
    StopVideo,
    Confetti,
    Schedule { timer: TimerKind, delay_ms: u64 },
}
