/// Media channel coordination: one looping background audio channel and
/// one single-play foreground video channel, never both running.
///
/// Starting either channel stops the other first. Start failures are
/// returned to the caller as `Event::MediaRejected` so the controller can
/// clear its flag; nothing here retries.

use tracing::debug;

use crate::error::MediaError;
use crate::sim::event::{Channel, Effect, Event};

/// A playback unit with start / pause / rewind semantics.
pub trait MediaChannel {
    /// Begin (or resume) playback. `source` names the media for channels
    /// that play different items; the audio channel ignores it.
    fn start(&mut self, source: Option<&str>) -> Result<(), MediaError>;

    /// Pause, keeping the playback position.
    fn pause(&mut self);

    /// Pause and rewind to the start.
    fn stop(&mut self);

    /// True once, when single-play media reaches its end.
    fn poll_ended(&mut self) -> bool {
        false
    }

    fn is_active(&self) -> bool;

    /// Playback progress in `[0, 1]` where the backend knows it.
    fn progress(&self) -> Option<f32> {
        None
    }
}

pub struct MediaCoordinator {
    audio: Box<dyn MediaChannel>,
    video: Box<dyn MediaChannel>,
}

impl MediaCoordinator {
    pub fn new(audio: Box<dyn MediaChannel>, video: Box<dyn MediaChannel>) -> Self {
        MediaCoordinator { audio, video }
    }

    pub fn start_audio(&mut self) -> Result<(), MediaError> {
        if self.video.is_active() {
            self.video.stop();
        }
        self.audio.start(None)
    }

    pub fn pause_audio(&mut self) {
        self.audio.pause();
    }

    pub fn stop_audio(&mut self) {
        self.audio.stop();
    }

    pub fn start_video(&mut self, source: &str) -> Result<(), MediaError> {
        self.audio.stop();
        self.video.start(Some(source))
    }

    pub fn stop_video(&mut self) {
        self.video.stop();
    }

    /// Completion hook: true once per finished video.
    pub fn video_ended(&mut self) -> bool {
        let ended = self.video.poll_ended();
        if ended {
            debug!("video ended");
        }
        ended
    }

    pub fn video_progress(&self) -> Option<f32> {
        self.video.progress()
    }

    /// Carry out a media effect. A rejected start comes back as an event
    /// for the controller. Non-media effects are ignored.
    pub fn execute(&mut self, effect: &Effect) -> Option<Event> {
        let result = match effect {
            Effect::StartAudio => self.start_audio().map_err(|e| (Channel::Audio, e)),
            Effect::PauseAudio => { self.pause_audio(); Ok(()) }
            Effect::StopAudio => { self.stop_audio(); Ok(()) }
            Effect::StartVideo { source } => {
                self.start_video(source).map_err(|e| (Channel::Video, e))
            }
            Effect::StopVideo => { self.stop_video(); Ok(()) }
            Effect::Confetti | Effect::Schedule { .. } => Ok(()),
        };

        match result {
            Ok(()) => None,
            Err((channel, err)) => {
                debug!(%channel, error = %err, "media start failed");
                Some(Event::MediaRejected { channel, reason: err.to_string() })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Channel that records calls and can be told to reject starts.
    struct Recorder {
        name: &'static str,
        log: Log,
        active: bool,
        position: u32,
        reject: bool,
        ends_after_start: bool,
    }

    impl Recorder {
        fn new(name: &'static str, log: &Log) -> Self {
            Recorder {
                name,
                log: log.clone(),
                active: false,
                position: 0,
                reject: false,
                ends_after_start: false,
            }
        }
    }

    impl MediaChannel for Recorder {
        fn start(&mut self, source: Option<&str>) -> Result<(), MediaError> {
            self.log.borrow_mut().push(format!("{}:start:{}", self.name, source.unwrap_or("-")));
            if self.reject {
                let channel = if self.name == "audio" { Channel::Audio } else { Channel::Video };
                return Err(MediaError::rejected(channel, "denied"));
            }
            self.active = true;
            self.position += 10;
            Ok(())
        }
        fn pause(&mut self) {
            self.log.borrow_mut().push(format!("{}:pause", self.name));
            self.active = false;
        }
        fn stop(&mut self) {
            self.log.borrow_mut().push(format!("{}:stop", self.name));
            self.active = false;
            self.position = 0;
        }
        fn poll_ended(&mut self) -> bool {
            if self.active && self.ends_after_start {
                self.active = false;
                return true;
            }
            false
        }
        fn is_active(&self) -> bool {
            self.active
        }
    }

    fn coordinator(log: &Log) -> MediaCoordinator {
        MediaCoordinator::new(
            Box::new(Recorder::new("audio", log)),
            Box::new(Recorder::new("video", log)),
        )
    }

    #[test]
    fn starting_video_stops_audio_first() {
        let log: Log = Rc::default();
        let mut m = coordinator(&log);
        m.execute(&Effect::StartAudio);
        m.execute(&Effect::StartVideo { source: "/blessing2.mp4".into() });
        assert_eq!(*log.borrow(), vec![
            "audio:start:-",
            "audio:stop",
            "video:start:/blessing2.mp4",
        ]);
    }

    #[test]
    fn starting_audio_stops_running_video() {
        let log: Log = Rc::default();
        let mut m = coordinator(&log);
        m.start_video("/v.mp4").unwrap();
        log.borrow_mut().clear();
        m.start_audio().unwrap();
        assert_eq!(*log.borrow(), vec!["video:stop", "audio:start:-"]);
    }

    #[test]
    fn pause_keeps_position_stop_rewinds() {
        let log: Log = Rc::default();
        let mut audio = Recorder::new("audio", &log);
        audio.start(None).unwrap();
        audio.pause();
        assert_eq!(audio.position, 10);
        audio.stop();
        assert_eq!(audio.position, 0);
    }

    #[test]
    fn rejected_start_becomes_event() {
        let log: Log = Rc::default();
        let mut audio = Recorder::new("audio", &log);
        audio.reject = true;
        let mut m = MediaCoordinator::new(Box::new(audio), Box::new(Recorder::new("video", &log)));

        let ev = m.execute(&Effect::StartAudio);
        assert!(matches!(
            ev,
            Some(Event::MediaRejected { channel: Channel::Audio, .. })
        ));
        assert!(m.execute(&Effect::PauseAudio).is_none());
    }

    #[test]
    fn video_end_reported_once() {
        let log: Log = Rc::default();
        let mut video = Recorder::new("video", &log);
        video.ends_after_start = true;
        let mut m = MediaCoordinator::new(Box::new(Recorder::new("audio", &log)), Box::new(video));

        assert!(!m.video_ended());
        m.start_video("/v.mp4").unwrap();
        assert!(m.video_ended());
        assert!(!m.video_ended());
    }
}
