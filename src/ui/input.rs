/// Keyboard state tracker.
///
/// Terminals don't report key-up reliably, so "held" is approximated:
/// a key counts as held until no Press/Repeat event has arrived for
/// `HOLD_TIMEOUT`. When the terminal's keyboard enhancement reports
/// Release events, those are honored instead.
///
/// Two views of a key:
///   - held     : continuous (movement, jump intent)
///   - pressed  : false-to-true edge this frame (menus, restart)
///
/// The jump's own edge trigger lives in the player, which compares the
/// held state against the previous frame; input only reports "held".

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::FrameInput;

const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
pub const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
pub const KEYS_JUMP: &[KeyCode] = &[
    KeyCode::Char(' '),
    KeyCode::Up,
    KeyCode::Char('w'),
    KeyCode::Char('W'),
    KeyCode::Char('z'),
    KeyCode::Char('Z'),
];
pub const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
pub const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];

pub struct InputState {
    /// Timestamp of the last Press/Repeat event per key.
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went not-held → held during the latest drain.
    fresh_presses: Vec<KeyCode>,
    /// Raw events from the latest drain, for modifier checks.
    raw_events: Vec<KeyEvent>,
    /// Honor explicit Release events (keyboard enhancement confirmed).
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events. Call once per frame, before
    /// the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.raw_events.push(key);
                match key.kind {
                    KeyEventKind::Release if self.honor_release => {
                        self.last_active.remove(&key.code);
                    }
                    KeyEventKind::Release => {
                        // No enhancement: rely on the timeout expiry
                    }
                    _ => {
                        let was_held = self.held(key.code);
                        self.last_active.insert(key.code, Instant::now());
                        if !was_held {
                            self.fresh_presses.push(key.code);
                        }
                    }
                }
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    /// The movement/jump intents for this frame, as held booleans.
    pub fn frame_input(&self) -> FrameInput {
        FrameInput {
            left: self.any_held(KEYS_LEFT),
            right: self.any_held(KEYS_RIGHT),
            jump: self.any_held(KEYS_JUMP),
        }
    }

    pub fn held(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.held(*c))
    }

    /// Freshly pressed this frame (edge trigger).
    pub fn pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}
