//! Keyboard input

use std::collections::HashSet;

use crate::sim::TickInput;

/// Game controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Left,
    Right,
    Jump,
    /// Toggles the debug overlay
    Debug,
}

impl Control {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" | "a" => Some(Control::Left),
            "ArrowRight" | "d" => Some(Control::Right),
            "ArrowUp" | "w" | " " => Some(Control::Jump),
            "F1" => Some(Control::Debug),
            _ => None,
        }
    }
}

/// Current state of the controls
pub trait InputSource {
    fn is_down(&self, control: Control) -> bool;

    /// Sample the movement controls for one tick
    fn tick_input(&self) -> TickInput {
        TickInput {
            left: self.is_down(Control::Left),
            right: self.is_down(Control::Right),
            jump: self.is_down(Control::Jump),
        }
    }
}

/// Held keys, fed from keydown/keyup events
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    held: HashSet<String>,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press. Returns the control if this press started it.
    pub fn key_down(&mut self, key: &str) -> Option<Control> {
        let control = Control::from_key(key)?;
        let was_down = self.is_down(control);
        self.held.insert(key.to_string());
        (!was_down).then_some(control)
    }

    pub fn key_up(&mut self, key: &str) {
        self.held.remove(key);
    }

    /// Release everything, e.g. when the window loses focus
    pub fn clear(&mut self) {
        self.held.clear();
    }
}

impl InputSource for KeyboardState {
    fn is_down(&self, control: Control) -> bool {
        self.held
            .iter()
            .any(|key| Control::from_key(key) == Some(control))
    }
}

/// Time-driven input for headless runs: run right, hop at a fixed period
#[derive(Debug, Clone, Copy)]
pub struct ScriptedInput {
    /// Seconds between jump presses
    pub jump_period: f32,
    /// How long each press is held
    pub jump_hold: f32,
    /// Seconds of running right per cycle
    pub run_for: f32,
    /// Seconds of running left per cycle
    pub back_for: f32,
    time: f32,
}

impl Default for ScriptedInput {
    fn default() -> Self {
        Self {
            jump_period: 0.9,
            jump_hold: 0.1,
            run_for: 2.5,
            back_for: 0.5,
            time: 0.0,
        }
    }
}

impl ScriptedInput {
    pub fn advance(&mut self, dt: f32) {
        self.time += dt;
    }
}

impl InputSource for ScriptedInput {
    fn is_down(&self, control: Control) -> bool {
        let cycle = self.run_for + self.back_for;
        let phase = if cycle > 0.0 { self.time % cycle } else { 0.0 };
        match control {
            Control::Right => phase < self.run_for,
            Control::Left => phase >= self.run_for,
            Control::Jump => {
                self.jump_period > 0.0 && self.time % self.jump_period < self.jump_hold
            }
            Control::Debug => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(Control::from_key("a"), Some(Control::Left));
        assert_eq!(Control::from_key("ArrowRight"), Some(Control::Right));
        assert_eq!(Control::from_key(" "), Some(Control::Jump));
        assert_eq!(Control::from_key("w"), Some(Control::Jump));
        assert_eq!(Control::from_key("F1"), Some(Control::Debug));
        assert_eq!(Control::from_key("q"), None);
    }

    #[test]
    fn test_aliases_share_a_control() {
        let mut kb = KeyboardState::new();
        assert_eq!(kb.key_down("ArrowLeft"), Some(Control::Left));
        // Second key for the same control is not a new press
        assert_eq!(kb.key_down("a"), None);
        kb.key_up("ArrowLeft");
        assert!(kb.is_down(Control::Left));
        kb.key_up("a");
        assert!(!kb.is_down(Control::Left));
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut kb = KeyboardState::new();
        kb.key_down("d");
        kb.key_down(" ");
        assert_eq!(
            kb.tick_input(),
            TickInput {
                left: false,
                right: true,
                jump: true
            }
        );
        kb.clear();
        assert_eq!(kb.tick_input(), TickInput::default());
    }

    #[test]
    fn test_unmapped_keys_are_ignored() {
        let mut kb = KeyboardState::new();
        assert_eq!(kb.key_down("Shift"), None);
        assert_eq!(kb.tick_input(), TickInput::default());
    }

    #[test]
    fn test_script_alternates() {
        let mut script = ScriptedInput::default();
        assert!(script.is_down(Control::Right));
        assert!(script.is_down(Control::Jump));
        script.advance(0.5);
        assert!(!script.is_down(Control::Jump));
        script.advance(2.2);
        assert!(script.is_down(Control::Left));
        assert!(!script.is_down(Control::Right));
    }
}
