/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick X   →  Run left / right
///   A / B                  →  Jump (held)
///   Start                  →  Confirm / Restart
///   Select                 →  Quit
///
/// Compiles to a no-op tracker without the "gamepad" feature.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A, // South
    B, // East
    X, // West
    Y, // North
    L1,
    R1,
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER" => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    jump: Vec<Btn>,
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
    restart: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            jump: vec![Btn::A, Btn::B],
            confirm: vec![Btn::Start],
            cancel: vec![Btn::Select],
            restart: vec![Btn::Start],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; 8],

    dpad_left: BtnState,
    dpad_right: BtnState,
    stick_left: BtnState,
    stick_right: BtnState,
    stick_x: f32,

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
            Err(_) => (None, false),
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); 8],
            dpad_left: BtnState::default(),
            dpad_right: BtnState::default(),
            stick_left: BtnState::default(),
            stick_right: BtnState::default(),
            stick_x: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let map = &mut self.action_map;
        let jump = parse_list(&cfg.jump);
        if !jump.is_empty() {
            map.jump = jump;
        }
        let confirm = parse_list(&cfg.confirm);
        if !confirm.is_empty() {
            map.confirm = confirm;
        }
        let cancel = parse_list(&cfg.cancel);
        if !cancel.is_empty() {
            map.cancel = cancel;
        }
        let restart = parse_list(&cfg.restart);
        if !restart.is_empty() {
            map.restart = restart;
        }
    }

    pub fn update(&mut self) {
        self.clear_just_pressed();

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
                    self.set_button(btn, true, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false, false);
                }
                EventType::AxisChanged(Axis::LeftStickX, value, _) => {
                    self.connected = true;
                    self.stick_x = value;
                }
                EventType::Connected => self.connected = true,
                EventType::Disconnected => {
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }

        // Derive stick digital states
        let prev_left = self.stick_left.held;
        let prev_right = self.stick_right.held;
        self.stick_left.held = self.stick_x < -STICK_DEADZONE;
        self.stick_right.held = self.stick_x > STICK_DEADZONE;
        if self.stick_left.held && !prev_left {
            self.stick_left.just_pressed = true;
        }
        if self.stick_right.held && !prev_right {
            self.stick_right.just_pressed = true;
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool, just_pressed: bool) {
        match gilrs_btn {
            Button::DPadLeft => {
                self.dpad_left.held = held;
                if just_pressed {
                    self.dpad_left.just_pressed = true;
                }
                return;
            }
            Button::DPadRight => {
                self.dpad_right.held = held;
                if just_pressed {
                    self.dpad_right.just_pressed = true;
                }
                return;
            }
            _ => {}
        }

        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            let idx = btn as usize;
            self.buttons[idx].held = held;
            if just_pressed {
                self.buttons[idx].just_pressed = true;
            }
        }
    }

    // ── Action queries (config-driven) ──

    fn any_held(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].held)
    }

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].just_pressed)
    }

    /// Jump is a held intent; the player's own edge trigger decides
    /// when it fires.
    pub fn jump_held(&self) -> bool {
        self.any_held(&self.action_map.jump)
    }

    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }

    pub fn cancel_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.cancel)
    }

    pub fn restart_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.restart)
    }

    pub fn left_held(&self) -> bool {
        self.dpad_left.held || self.stick_left.held
    }

    pub fn right_held(&self) -> bool {
        self.dpad_right.held || self.stick_right.held
    }

    // ── Internal ──

    fn clear_just_pressed(&mut self) {
        for b in &mut self.buttons {
            b.just_pressed = false;
        }
        self.dpad_left.just_pressed = false;
        self.dpad_right.just_pressed = false;
        self.stick_left.just_pressed = false;
        self.stick_right.just_pressed = false;
    }

    fn release_all(&mut self) {
        for b in &mut self.buttons {
            *b = BtnState::default();
        }
        self.dpad_left = BtnState::default();
        self.dpad_right = BtnState::default();
        self.stick_left = BtnState::default();
        self.stick_right = BtnState::default();
        self.stick_x = 0.0;
    }
}
