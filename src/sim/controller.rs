/// PresentationController: owns the session state, the blessing pool and
/// the deferred-event scheduler.
///
/// Input handlers call the named operations (or `dispatch` directly); the
/// main loop calls `advance` once per frame so due timers fire as events.
/// Both return the effects left for the media coordinator and renderer;
/// `Effect::Schedule` is consumed here and never leaves the controller.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::domain::blessing::BlessingPool;
use super::event::{Effect, Event};
use super::state::PresentationState;
use super::step::{self, StepRules};
use super::timer::Scheduler;

pub struct PresentationController<R: Rng = StdRng> {
    state: PresentationState,
    pool: BlessingPool,
    rules: StepRules,
    rng: R,
    scheduler: Scheduler,
}

impl PresentationController<StdRng> {
    pub fn new(pool: BlessingPool, rules: StepRules) -> Self {
        Self::with_rng(pool, rules, StdRng::from_entropy())
    }
}

impl<R: Rng> PresentationController<R> {
    pub fn with_rng(pool: BlessingPool, rules: StepRules, rng: R) -> Self {
        PresentationController {
            state: PresentationState::new(),
            pool,
            rules,
            rng,
            scheduler: Scheduler::new(),
        }
    }

    pub fn state(&self) -> &PresentationState {
        &self.state
    }

    /// Apply one event. Scheduling requests are registered against `now_ms`.
    pub fn dispatch(&mut self, event: Event, now_ms: u64) -> Vec<Effect> {
        let effects = step::step(&mut self.state, &event, &self.pool, &self.rules, &mut self.rng);
        let mut out = Vec::with_capacity(effects.len());
        for effect in effects {
            match effect {
                Effect::Schedule { timer, delay_ms } => {
                    debug!(?timer, delay_ms, "timer scheduled");
                    self.scheduler.schedule(now_ms, delay_ms, timer);
                }
                other => out.push(other),
            }
        }
        out
    }

    /// Fire every timer due at `now_ms`.
    pub fn advance(&mut self, now_ms: u64) -> Vec<Effect> {
        let mut out = Vec::new();
        for timer in self.scheduler.drain_due(now_ms) {
            out.extend(self.dispatch(Event::Timer(timer), now_ms));
        }
        out
    }

    // ── Named operations ──

    pub fn open(&mut self, now_ms: u64) -> Vec<Effect> {
        self.dispatch(Event::Open, now_ms)
    }

    pub fn play_video(&mut self, now_ms: u64) -> Vec<Effect> {
        self.dispatch(Event::PlayVideo, now_ms)
    }

    pub fn on_video_ended(&mut self, now_ms: u64) -> Vec<Effect> {
        self.dispatch(Event::VideoEnded, now_ms)
    }

    pub fn toggle_music(&mut self, now_ms: u64) -> Vec<Effect> {
        self.dispatch(Event::ToggleMusic, now_ms)
    }

    pub fn register_easter_egg_click(&mut self, now_ms: u64) -> Vec<Effect> {
        self.dispatch(Event::EasterEggClick, now_ms)
    }

    pub fn close_easter_egg(&mut self, now_ms: u64) -> Vec<Effect> {
        self.dispatch(Event::CloseEasterEgg, now_ms)
    }

    pub fn reopen_easter_egg(&mut self, now_ms: u64) -> Vec<Effect> {
        self.dispatch(Event::ReopenEasterEgg, now_ms)
    }

    /// Tear down: cancel pending timers and stop whatever is playing.
    /// Every later event is ignored.
    pub fn dispose(&mut self) -> Vec<Effect> {
        if self.state.disposed { return vec![]; }
        let cancelled = self.scheduler.len();
        self.scheduler.cancel_all();

        let mut out = Vec::new();
        if self.state.music_playing {
            out.push(Effect::StopAudio);
            self.state.music_playing = false;
        }
        if self.state.video_playing {
            out.push(Effect::StopVideo);
            self.state.video_playing = false;
        }
        self.state.disposed = true;
        info!(cancelled, "presentation disposed");
        out
    }
}
