/// The transition function: applies one event to the presentation state.
///
/// `step` mutates the state in place and returns the effects the outside
/// world must carry out. It never touches media, timers or the terminal
/// itself, so every transition is testable without a rendering layer.
///
/// Events outside their precondition are silent no-ops.

use rand::Rng;
use tracing::{debug, info, warn};

use crate::domain::blessing::BlessingPool;
use super::event::{Channel, Effect, Event, TimerKind};
use super::state::{Phase, PresentationState};

/// Fixed parameters of the state machine.
#[derive(Clone, Debug)]
pub struct StepRules {
    pub music_delay_ms: u64,
    pub achievement_ms: u64,
    pub easter_egg_threshold: u32,
}

impl Default for StepRules {
    fn default() -> Self {
        StepRules {
            music_delay_ms: 500,
            achievement_ms: 3000,
            easter_egg_threshold: 5,
        }
    }
}

pub fn step<R: Rng + ?Sized>(
    state: &mut PresentationState,
    event: &Event,
    pool: &BlessingPool,
    rules: &StepRules,
    rng: &mut R,
) -> Vec<Effect> {
    if state.disposed { return vec![]; }

    let mut effects = Vec::new();
    match event {
        Event::Open => open(state, pool, rules, rng, &mut effects),
        Event::PlayVideo => play_video(state, &mut effects),
        Event::VideoEnded => {
            // Music stays off; the user turns it back on by hand.
            state.video_playing = false;
        }
        Event::ToggleMusic => toggle_music(state, &mut effects),
        Event::EasterEggClick => easter_egg_click(state, rules, &mut effects),
        Event::CloseEasterEgg => state.easter_egg_visible = false,
        Event::ReopenEasterEgg => reopen_easter_egg(state, &mut effects),
        Event::MediaRejected { channel, reason } => {
            warn!(%channel, %reason, "media start rejected");
            match channel {
                Channel::Audio => state.music_playing = false,
                Channel::Video => state.video_playing = false,
            }
        }
        Event::Timer(TimerKind::MusicStartDue) => delayed_music_start(state, &mut effects),
        Event::Timer(TimerKind::AchievementClear) => state.achievement_visible = false,
    }
    effects
}

// ══════════════════════════════════════════════════════════════
// Envelope
// ══════════════════════════════════════════════════════════════

fn open<R: Rng + ?Sized>(
    state: &mut PresentationState,
    pool: &BlessingPool,
    rules: &StepRules,
    rng: &mut R,
    effects: &mut Vec<Effect>,
) {
    if state.phase != Phase::Closed { return; }

    let item = pool.draw(rng).clone();
    info!(source = %item.source, title = %item.title, "envelope opened");
    state.selected = Some(item);
    state.phase = Phase::Open;
    effects.push(Effect::Confetti);
    effects.push(Effect::Schedule {
        timer: TimerKind::MusicStartDue,
        delay_ms: rules.music_delay_ms,
    });
}

fn delayed_music_start(state: &mut PresentationState, effects: &mut Vec<Effect>) {
    if !state.is_open() { return; }
    // The user already picked something to watch or listen to.
    if state.music_playing || state.video_playing || state.easter_egg_visible {
        debug!("delayed music start skipped");
        return;
    }
    effects.push(Effect::StartAudio);
    state.music_playing = true;
}

// ══════════════════════════════════════════════════════════════
// Media
// ══════════════════════════════════════════════════════════════

fn stop_music(state: &mut PresentationState, effects: &mut Vec<Effect>) {
    if state.music_playing {
        effects.push(Effect::StopAudio);
        state.music_playing = false;
    }
}

fn play_video(state: &mut PresentationState, effects: &mut Vec<Effect>) {
    if !state.is_open() || state.video_playing { return; }
    let source = match &state.selected {
        Some(item) => item.source.clone(),
        None => return,
    };
    stop_music(state, effects);
    effects.push(Effect::StartVideo { source });
    state.video_playing = true;
}

fn toggle_music(state: &mut PresentationState, effects: &mut Vec<Effect>) {
    if !state.is_open() { return; }
    if state.music_playing {
        effects.push(Effect::PauseAudio);
        state.music_playing = false;
    } else {
        if state.video_playing {
            effects.push(Effect::StopVideo);
            state.video_playing = false;
        }
        effects.push(Effect::StartAudio);
        state.music_playing = true;
    }
}

// ══════════════════════════════════════════════════════════════
// Easter egg
// ══════════════════════════════════════════════════════════════

fn easter_egg_click(state: &mut PresentationState, rules: &StepRules, effects: &mut Vec<Effect>) {
    if !state.is_open() { return; }

    state.click_count = state.click_count.saturating_add(1);
    if state.click_count < rules.easter_egg_threshold || state.easter_egg_unlocked {
        return;
    }

    info!(clicks = state.click_count, "easter egg unlocked");
    state.easter_egg_unlocked = true;
    state.easter_egg_visible = true;
    state.achievement_visible = true;
    stop_music(state, effects);
    effects.push(Effect::Schedule {
        timer: TimerKind::AchievementClear,
        delay_ms: rules.achievement_ms,
    });
}

fn reopen_easter_egg(state: &mut PresentationState, effects: &mut Vec<Effect>) {
    if !state.easter_egg_unlocked || state.easter_egg_visible { return; }
    state.easter_egg_visible = true;
    stop_music(state, effects);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::blessing::BlessingItem;
    use rand::{rngs::StdRng, SeedableRng};

    struct Harness {
        state: PresentationState,
        pool: BlessingPool,
        rules: StepRules,
        rng: StdRng,
    }

    impl Harness {
        fn new() -> Self {
            Harness {
                state: PresentationState::new(),
                pool: BlessingPool::builtin(),
                rules: StepRules::default(),
                rng: StdRng::seed_from_u64(42),
            }
        }

        fn send(&mut self, ev: Event) -> Vec<Effect> {
            let fx = step(&mut self.state, &ev, &self.pool, &self.rules, &mut self.rng);
            assert!(
                !(self.state.music_playing && self.state.video_playing),
                "both channels active after {ev:?}"
            );
            assert_eq!(self.state.selected.is_some(), self.state.phase == Phase::Open);
            fx
        }

        fn opened() -> Self {
            let mut h = Self::new();
            h.send(Event::Open);
            h
        }
    }

    // ── Open ──

    #[test]
    fn open_selects_from_pool_and_requests_effects() {
        let mut h = Harness::new();
        let fx = h.send(Event::Open);

        assert_eq!(h.state.phase, Phase::Open);
        let item = h.state.selected.clone().unwrap();
        assert!(h.pool.items().contains(&item));
        assert_eq!(fx, vec![
            Effect::Confetti,
            Effect::Schedule { timer: TimerKind::MusicStartDue, delay_ms: 500 },
        ]);
    }

    #[test]
    fn second_open_is_ignored() {
        let mut h = Harness::opened();
        let before = h.state.clone();
        let fx = h.send(Event::Open);
        assert!(fx.is_empty());
        assert_eq!(h.state, before);
    }

    #[test]
    fn open_with_default_pool_picks_a_literal_pair() {
        let literals = [
            ("/blessing1.mp4", "大吉大利"),
            ("/blessing2.mp4", "财源广进"),
            ("/blessing3.mp4", "万事如意"),
            ("/blessing4.mp4", "心想事成"),
            ("/blessing5.mp4", "福星高照"),
        ];
        for seed in 0..20 {
            let mut h = Harness::new();
            h.rng = StdRng::seed_from_u64(seed);
            h.send(Event::Open);
            let item = h.state.selected.unwrap();
            assert!(literals.iter().any(|(s, t)| BlessingItem::new(*s, *t) == item));
        }
    }

    #[test]
    fn delayed_music_start_turns_music_on() {
        let mut h = Harness::opened();
        let fx = h.send(Event::Timer(TimerKind::MusicStartDue));
        assert_eq!(fx, vec![Effect::StartAudio]);
        assert!(h.state.music_playing);
    }

    #[test]
    fn delayed_music_start_skipped_when_video_started_first() {
        let mut h = Harness::opened();
        h.send(Event::PlayVideo);
        let fx = h.send(Event::Timer(TimerKind::MusicStartDue));
        assert!(fx.is_empty());
        assert!(!h.state.music_playing);
        assert!(h.state.video_playing);
    }

    // ── Closed-phase no-ops ──

    #[test]
    fn operations_while_closed_do_nothing() {
        let mut h = Harness::new();
        for ev in [
            Event::PlayVideo,
            Event::ToggleMusic,
            Event::EasterEggClick,
            Event::ReopenEasterEgg,
            Event::Timer(TimerKind::MusicStartDue),
        ] {
            assert!(h.send(ev).is_empty());
        }
        assert_eq!(h.state, PresentationState::new());
    }

    // ── Video ──

    #[test]
    fn play_video_stops_music() {
        let mut h = Harness::opened();
        h.send(Event::Timer(TimerKind::MusicStartDue));
        assert!(h.state.music_playing);

        let fx = h.send(Event::PlayVideo);
        let source = h.state.selected.as_ref().unwrap().source.clone();
        assert_eq!(fx, vec![Effect::StopAudio, Effect::StartVideo { source }]);
        assert!(!h.state.music_playing);
        assert!(h.state.video_playing);
    }

    #[test]
    fn play_video_twice_is_noop() {
        let mut h = Harness::opened();
        h.send(Event::PlayVideo);
        assert!(h.send(Event::PlayVideo).is_empty());
    }

    #[test]
    fn video_end_does_not_resume_music() {
        let mut h = Harness::opened();
        h.send(Event::Timer(TimerKind::MusicStartDue));
        h.send(Event::PlayVideo);
        let fx = h.send(Event::VideoEnded);
        assert!(fx.is_empty());
        assert!(!h.state.video_playing);
        assert!(!h.state.music_playing);
    }

    // ── Music ──

    #[test]
    fn toggle_music_pauses_then_restarts() {
        let mut h = Harness::opened();
        assert_eq!(h.send(Event::ToggleMusic), vec![Effect::StartAudio]);
        assert!(h.state.music_playing);
        assert_eq!(h.send(Event::ToggleMusic), vec![Effect::PauseAudio]);
        assert!(!h.state.music_playing);
    }

    #[test]
    fn toggle_music_during_video_stops_video() {
        let mut h = Harness::opened();
        h.send(Event::PlayVideo);
        let fx = h.send(Event::ToggleMusic);
        assert_eq!(fx, vec![Effect::StopVideo, Effect::StartAudio]);
        assert!(h.state.music_playing);
        assert!(!h.state.video_playing);
    }

    #[test]
    fn rejected_start_clears_flag() {
        let mut h = Harness::opened();
        h.send(Event::ToggleMusic);
        h.send(Event::MediaRejected { channel: Channel::Audio, reason: "no device".into() });
        assert!(!h.state.music_playing);

        h.send(Event::PlayVideo);
        h.send(Event::MediaRejected { channel: Channel::Video, reason: "spawn failed".into() });
        assert!(!h.state.video_playing);
    }

    #[test]
    fn channels_never_both_active_for_mixed_sequences() {
        let events = [
            Event::PlayVideo,
            Event::ToggleMusic,
            Event::Timer(TimerKind::MusicStartDue),
            Event::VideoEnded,
            Event::EasterEggClick,
            Event::ReopenEasterEgg,
        ];
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..50 {
            let mut h = Harness::opened();
            for _ in 0..40 {
                let ev = events[rng.gen_range(0..events.len())].clone();
                h.send(ev); // send() asserts exclusivity
            }
        }
    }

    // ── Easter egg ──

    #[test]
    fn five_clicks_unlock() {
        let mut h = Harness::opened();
        h.send(Event::Timer(TimerKind::MusicStartDue));
        for _ in 0..4 {
            assert!(h.send(Event::EasterEggClick).is_empty());
        }
        assert!(!h.state.easter_egg_unlocked);

        let fx = h.send(Event::EasterEggClick);
        assert_eq!(fx, vec![
            Effect::StopAudio,
            Effect::Schedule { timer: TimerKind::AchievementClear, delay_ms: 3000 },
        ]);
        assert!(h.state.easter_egg_unlocked);
        assert!(h.state.easter_egg_visible);
        assert!(h.state.achievement_visible);
        assert!(!h.state.music_playing);
    }

    #[test]
    fn sixth_click_changes_nothing_visible() {
        let mut h = Harness::opened();
        for _ in 0..5 { h.send(Event::EasterEggClick); }
        let fx = h.send(Event::EasterEggClick);
        assert!(fx.is_empty());
        assert!(h.state.easter_egg_unlocked);
        assert_eq!(h.state.click_label(5), None);
    }

    #[test]
    fn close_before_unlock_then_unlock() {
        let mut h = Harness::opened();
        for _ in 0..4 { h.send(Event::EasterEggClick); }
        h.send(Event::CloseEasterEgg);
        assert!(!h.state.easter_egg_unlocked);
        assert!(!h.state.easter_egg_visible);

        h.send(Event::EasterEggClick);
        assert!(h.state.easter_egg_unlocked);
        assert!(h.state.easter_egg_visible);
    }

    #[test]
    fn close_after_unlock_keeps_latch() {
        let mut h = Harness::opened();
        for _ in 0..5 { h.send(Event::EasterEggClick); }
        h.send(Event::CloseEasterEgg);
        assert!(!h.state.easter_egg_visible);
        assert!(h.state.easter_egg_unlocked);

        // More clicks do not bring the overlay back.
        h.send(Event::EasterEggClick);
        assert!(!h.state.easter_egg_visible);
    }

    #[test]
    fn reopen_only_after_unlock() {
        let mut h = Harness::opened();
        h.send(Event::ReopenEasterEgg);
        assert!(!h.state.easter_egg_visible);

        for _ in 0..5 { h.send(Event::EasterEggClick); }
        h.send(Event::CloseEasterEgg);
        h.send(Event::ToggleMusic);
        let fx = h.send(Event::ReopenEasterEgg);
        assert_eq!(fx, vec![Effect::StopAudio]);
        assert!(h.state.easter_egg_visible);
        assert!(!h.state.music_playing);
    }

    #[test]
    fn achievement_clear_hides_banner_only() {
        let mut h = Harness::opened();
        for _ in 0..5 { h.send(Event::EasterEggClick); }
        h.send(Event::Timer(TimerKind::AchievementClear));
        assert!(!h.state.achievement_visible);
        assert!(h.state.easter_egg_visible);
        assert!(h.state.easter_egg_unlocked);
    }

    #[test]
    fn disposed_state_ignores_events() {
        let mut h = Harness::new();
        h.state.disposed = true;
        assert!(h.send(Event::Open).is_empty());
        assert_eq!(h.state.phase, Phase::Closed);
    }
}
