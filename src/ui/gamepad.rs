/// Gamepad input using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   A / Start    →  Confirm (open envelope, play video)
///   Y            →  Toggle music
///   X            →  Tap the signature (easter egg)
///   B / Select   →  Close the easter egg overlay
///
/// Without the "gamepad" feature every query reports false.

#[cfg(feature = "gamepad")]
use gilrs::{Button, EventType, Gilrs};

use crate::config::GamepadConfig;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    Start,
    Select,
}

const BTN_COUNT: usize = 8;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB"    => Some(Btn::L1),
            "R1" | "RB"    => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South        => Some(Btn::A),
            Button::East         => Some(Btn::B),
            Button::West         => Some(Btn::X),
            Button::North        => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start        => Some(Btn::Start),
            Button::Select       => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    confirm: Vec<Btn>,
    music: Vec<Btn>,
    sign: Vec<Btn>,
    cancel: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            confirm: vec![Btn::A, Btn::Start],
            music:   vec![Btn::Y],
            sign:    vec![Btn::X],
            cancel:  vec![Btn::B, Btn::Select],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Buttons pressed since the last `update()`, indexed by `Btn`.
    just_pressed: [bool; BTN_COUNT],

    action_map: ActionMap,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(e) => {
                tracing::debug!(error = %e, "gamepad support unavailable");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            just_pressed: [false; BTN_COUNT],
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Lists with no recognizable
    /// button name keep the default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        fn apply(slot: &mut Vec<Btn>, names: &[String]) {
            let parsed = parse_list(names);
            if !parsed.is_empty() { *slot = parsed; }
        }
        let map = &mut self.action_map;
        apply(&mut map.confirm, &cfg.confirm);
        apply(&mut map.music, &cfg.music);
        apply(&mut map.sign, &cfg.sign);
        apply(&mut map.cancel, &cfg.cancel);
    }

    pub fn update(&mut self) {
        self.just_pressed = [false; BTN_COUNT];

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    if let Some(b) = Btn::from_gilrs(btn) {
                        self.just_pressed[b as usize] = true;
                    }
                }
                EventType::Connected => { self.connected = true; }
                EventType::Disconnected => {
                    self.connected = false;
                    self.just_pressed = [false; BTN_COUNT];
                }
                _ => {}
            }
        }
    }

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.just_pressed[b as usize])
    }

    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }
    pub fn music_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.music)
    }
    pub fn sign_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.sign)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.cancel)
    }
}
