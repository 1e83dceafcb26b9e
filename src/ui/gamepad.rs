/// Gamepad input using gilrs, translated into keyboard `Key`s.
///
/// Button mapping is loaded from config.toml (`[gamepad]`).
/// Default mapping:
///   Start / A        →  start        (s)
///   A / X            →  celebrate    (c)
///   D-pad ← / L1     →  previous product
///   D-pad → / R1     →  next product
///   Left stick x     →  previous / next
///   Select           →  quit
///
/// A button bound to several actions yields one key per action; the
/// session ignores keys that mean nothing in its current state.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::ui::input::Key;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.5;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    start: Vec<Btn>,
    celebrate: Vec<Btn>,
    prev: Vec<Btn>,
    next: Vec<Btn>,
    quit: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            start:     vec![Btn::Start, Btn::A],
            celebrate: vec![Btn::A, Btn::X],
            prev:      vec![Btn::L1],
            next:      vec![Btn::R1],
            quit:      vec![Btn::Select],
        }
    }
}

impl ActionMap {
    /// Keys produced by one press of `btn`, in a fixed action order.
    fn keys_for(&self, btn: Btn) -> Vec<Key> {
        [
            (&self.quit, Key::Quit),
            (&self.start, Key::Char('s')),
            (&self.celebrate, Key::Char('c')),
            (&self.prev, Key::Left),
            (&self.next, Key::Right),
        ]
        .into_iter()
        .filter(|(btns, _)| btns.contains(&btn))
        .map(|(_, key)| key)
        .collect()
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    action_map: ActionMap,
    /// -1, 0 or 1: which side the stick is currently pushed to.
    stick_side: i8,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    (Some(g), has_pad)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "gamepad support unavailable");
                    (None, false)
                }
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            action_map: ActionMap::default(),
            stick_side: 0,
            connected,
        }
    }

    /// Load button mapping from config. Empty or unknown lists keep the default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let map = &mut self.action_map;
        for (target, names) in [
            (&mut map.start, &cfg.start),
            (&mut map.celebrate, &cfg.celebrate),
            (&mut map.prev, &cfg.prev),
            (&mut map.next, &cfg.next),
            (&mut map.quit, &cfg.quit),
        ] {
            let parsed = parse_list(names);
            if !parsed.is_empty() {
                *target = parsed;
            }
        }
    }

    /// Drain pending gamepad events into keys.
    pub fn poll(&mut self) -> Vec<Key> {
        #[cfg(feature = "gamepad")]
        {
            self.poll_gilrs()
        }
        #[cfg(not(feature = "gamepad"))]
        {
            Vec::new()
        }
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) -> Vec<Key> {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return Vec::new(),
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();
        let mut keys = Vec::new();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    match btn {
                        Button::DPadLeft => keys.push(Key::Left),
                        Button::DPadRight => keys.push(Key::Right),
                        other => {
                            if let Some(b) = Btn::from_gilrs(other) {
                                keys.extend(self.action_map.keys_for(b));
                            }
                        }
                    }
                }
                EventType::AxisChanged(Axis::LeftStickX, value, _) => {
                    self.connected = true;
                    keys.extend(self.stick_moved(value));
                }
                EventType::Connected => { self.connected = true; }
                EventType::Disconnected => {
                    self.connected = false;
                    self.stick_side = 0;
                }
                _ => {}
            }
        }
        keys
    }

    /// Edge-trigger the stick: one key each time it crosses the deadzone.
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn stick_moved(&mut self, x: f32) -> Option<Key> {
        let side = if x < -STICK_DEADZONE {
            -1
        } else if x > STICK_DEADZONE {
            1
        } else {
            0
        };
        let prev = std::mem::replace(&mut self.stick_side, side);
        match (prev, side) {
            (p, -1) if p != -1 => Some(Key::Left),
            (p, 1) if p != 1 => Some(Key::Right),
            _ => None,
        }
    }
}
