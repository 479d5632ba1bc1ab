/// Entry point and presentation loop.

mod config;
mod domain;
mod error;
mod logging;
mod media;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing::info;

use config::CardConfig;
use domain::confetti::{ConfettiBurst, ConfettiParams};
use domain::motes::{spawn_motes, Mote};
use media::MediaCoordinator;
use sim::controller::PresentationController;
use sim::event::Effect;
use sim::state::Phase;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::{Renderer, Scene, Target};
use ui::sound::{track_paths, MusicChannel};
use ui::video::VideoChannel;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Loop-side state the controller does not own: the visual layers.
struct Stage {
    confetti: Option<ConfettiBurst>,
    motes: Vec<Mote>,
    opened_at: Option<u64>,
}

fn main() {
    logging::init();
    let config = CardConfig::load();
    let titles: Vec<&str> = config.pool.items().iter().map(|b| b.title.as_str()).collect();
    info!(?titles, "starting");

    let mut controller = PresentationController::new(config.pool.clone(), config.step_rules());

    let tracks = track_paths(&config.media.assets_dir, &config.media.background_music);
    let mut media = MediaCoordinator::new(
        Box::new(MusicChannel::new(tracks)),
        Box::new(VideoChannel::new(
            &config.media.video_player,
            &config.media.assets_dir,
            config.media.video_duration,
        )),
    );

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = card_loop(&mut controller, &mut media, &mut renderer, &config);

    // Teardown: no timer may fire and nothing keeps playing.
    for effect in controller.dispose() {
        media.execute(&effect);
    }

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        tracing::error!(error = %e, "presentation loop failed");
        eprintln!("Error: {e}");
    }

    println!();
    match &controller.state().selected {
        Some(item) => println!("🧧 {}！新春快乐！", item.title),
        None => println!("🧧 红包还没拆呢，下次再来！"),
    }
}

fn card_loop(
    controller: &mut PresentationController,
    media: &mut MediaCoordinator,
    renderer: &mut Renderer,
    config: &CardConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if gp.connected {
        info!("gamepad connected");
    }

    let mut rng = rand::thread_rng();
    let mut stage = Stage {
        confetti: None,
        motes: spawn_motes(&mut rng),
        opened_at: None,
    };

    let clock = Instant::now();
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms);

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || kb.any_pressed(&[KeyCode::Char('q'), KeyCode::Char('Q')]) {
            break;
        }

        let now_ms = clock.elapsed().as_millis() as u64;
        let was_open = controller.state().is_open();

        let mut effects = Vec::new();
        for intent in collect_intents(renderer, &kb, &gp) {
            effects.extend(apply_intent(controller, intent, now_ms));
        }
        effects.extend(controller.advance(now_ms));
        if media.video_ended() {
            effects.extend(controller.on_video_ended(now_ms));
        }

        // Rejected media starts come back as events; drain until quiet.
        while !effects.is_empty() {
            let mut rejected = Vec::new();
            for effect in effects.drain(..) {
                if effect == Effect::Confetti {
                    let params = ConfettiParams {
                        duration_ms: config.timing.confetti_ms,
                        ..ConfettiParams::default()
                    };
                    stage.confetti = Some(ConfettiBurst::new(now_ms, params));
                } else if let Some(event) = media.execute(&effect) {
                    rejected.push(event);
                }
            }
            for event in rejected {
                effects.extend(controller.dispatch(event, now_ms));
            }
        }

        if !was_open && controller.state().is_open() {
            stage.opened_at = Some(now_ms);
        }

        if last_tick.elapsed() >= tick_rate {
            if let Some(burst) = &mut stage.confetti {
                burst.tick(now_ms, &mut rng);
            }
            if stage.confetti.as_ref().map_or(false, |b| b.is_finished(now_ms)) {
                stage.confetti = None;
            }

            let scene = Scene {
                state: controller.state(),
                text: &config.text,
                easter_egg: &config.easter_egg,
                confetti: stage.confetti.as_ref(),
                motes: &stage.motes,
                elapsed_ms: now_ms,
                since_open_ms: stage.opened_at.map(|t| now_ms.saturating_sub(t)),
                video_progress: media.video_progress(),
                hover: kb.hover(),
            };
            renderer.render(&scene)?;
            last_tick = Instant::now();
        }

        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// One frame's worth of user intent, before the card's state is consulted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Intent {
    Confirm,
    Music,
    Sign,
    Reopen,
    Cancel,
    Click(Target),
}

/// Keys, buttons and clicks this frame, in that order.
fn collect_intents(renderer: &Renderer, kb: &InputState, gp: &GamepadState) -> Vec<Intent> {
    let mut intents = Vec::new();

    if kb.any_pressed(&[KeyCode::Enter, KeyCode::Char(' ')]) || gp.confirm_pressed() {
        intents.push(Intent::Confirm);
    }
    if kb.any_pressed(&[KeyCode::Char('m'), KeyCode::Char('M')]) || gp.music_pressed() {
        intents.push(Intent::Music);
    }
    if kb.any_pressed(&[KeyCode::Char('s'), KeyCode::Char('S')]) || gp.sign_pressed() {
        intents.push(Intent::Sign);
    }
    if kb.any_pressed(&[KeyCode::Char('e'), KeyCode::Char('E')]) {
        intents.push(Intent::Reopen);
    }
    if kb.was_pressed(KeyCode::Esc) || gp.cancel_pressed() {
        intents.push(Intent::Cancel);
    }

    intents.extend(
        kb.clicks()
            .iter()
            .filter_map(|&(col, row)| renderer.hit_test(col, row))
            .map(Intent::Click),
    );
    intents
}

/// Route an intent to the controller operation it stands for. While the
/// easter egg is up, confirm closes it and the signature is out of reach.
fn apply_intent(controller: &mut PresentationController, intent: Intent, now_ms: u64) -> Vec<Effect> {
    let modal = controller.state().easter_egg_visible;
    let phase = controller.state().phase;

    match intent {
        Intent::Confirm if modal => controller.close_easter_egg(now_ms),
        Intent::Confirm => match phase {
            Phase::Closed => controller.open(now_ms),
            Phase::Open => controller.play_video(now_ms),
        },
        Intent::Sign if modal => vec![],
        Intent::Sign => controller.register_easter_egg_click(now_ms),
        Intent::Music => controller.toggle_music(now_ms),
        Intent::Reopen => controller.reopen_easter_egg(now_ms),
        Intent::Cancel => controller.close_easter_egg(now_ms),
        Intent::Click(target) => match target {
            Target::Envelope => controller.open(now_ms),
            Target::PlayButton => controller.play_video(now_ms),
            Target::Signature => controller.register_easter_egg_click(now_ms),
            Target::MusicButton => controller.toggle_music(now_ms),
            Target::OverlayClose | Target::OverlayBackdrop => controller.close_easter_egg(now_ms),
            // Clicks inside the player stay there.
            Target::OverlayPanel => vec![],
        },
    }
}
