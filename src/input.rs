//! Keyboard/pointer aggregation into per-tick intents
//!
//! Raw key events arrive as physical key codes ("KeyW", "ArrowLeft", ...).
//! Held intents stay on until released; one-shot intents fire once per
//! press and are consumed by the next `snapshot`.

use crate::sim::TickInput;

/// Something a key can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Clockwise,
    CounterClockwise,
    Up,
    Down,
    Left,
    Right,
    Precision,
    /// Place markers (one-shot)
    Action,
    /// Final combined check (one-shot)
    FinalAction,
}

impl Intent {
    /// Fires once per press instead of being held
    pub fn is_one_shot(&self) -> bool {
        matches!(self, Intent::Action | Intent::FinalAction)
    }
}

/// Key code to intent table. Some keys look swapped (D spins clockwise, E
/// strafes left) because the camera looks down at the agents from outside.
pub static KEY_BINDINGS: &[(&str, Intent)] = &[
    ("KeyD", Intent::Clockwise),
    ("ArrowLeft", Intent::Clockwise),
    ("KeyA", Intent::CounterClockwise),
    ("ArrowRight", Intent::CounterClockwise),
    ("KeyW", Intent::Up),
    ("ArrowUp", Intent::Up),
    ("KeyS", Intent::Down),
    ("ArrowDown", Intent::Down),
    ("KeyE", Intent::Left),
    ("KeyQ", Intent::Right),
    ("ShiftLeft", Intent::Precision),
    ("ShiftRight", Intent::Precision),
    ("Space", Intent::Action),
    ("Enter", Intent::FinalAction),
];

/// Intent bound to a key code (ASCII case-insensitive)
pub fn intent_for_code(code: &str) -> Option<Intent> {
    KEY_BINDINGS
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(code))
        .map(|(_, intent)| *intent)
}

/// Live input state between ticks
#[derive(Debug, Clone, Default)]
pub struct InputState {
    clockwise: bool,
    counter_clockwise: bool,
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    precision: bool,
    action: bool,
    final_action: bool,
    pointer_pressed: bool,
    /// Debug: place on every recorded crossing
    pub autoplace: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, intent: Intent) -> &mut bool {
        match intent {
            Intent::Clockwise => &mut self.clockwise,
            Intent::CounterClockwise => &mut self.counter_clockwise,
            Intent::Up => &mut self.up,
            Intent::Down => &mut self.down,
            Intent::Left => &mut self.left,
            Intent::Right => &mut self.right,
            Intent::Precision => &mut self.precision,
            Intent::Action => &mut self.action,
            Intent::FinalAction => &mut self.final_action,
        }
    }

    /// Key pressed. Auto-repeat events are ignored. Returns the intent the
    /// key mapped to, if any.
    pub fn key_down(&mut self, code: &str, repeat: bool) -> Option<Intent> {
        if repeat {
            return None;
        }
        let intent = intent_for_code(code)?;
        *self.slot(intent) = true;
        Some(intent)
    }

    /// Key released. One-shot intents stay latched until consumed.
    pub fn key_up(&mut self, code: &str) -> Option<Intent> {
        let intent = intent_for_code(code)?;
        if !intent.is_one_shot() {
            *self.slot(intent) = false;
        }
        Some(intent)
    }

    pub fn pointer_down(&mut self) {
        self.pointer_pressed = true;
    }

    /// Release everything (e.g. the window lost focus)
    pub fn clear(&mut self) {
        *self = Self {
            autoplace: self.autoplace,
            ..Self::default()
        };
    }

    /// Build this tick's input and consume the one-shot intents
    pub fn snapshot(&mut self) -> TickInput {
        let axis = |pos: bool, neg: bool| f64::from(u8::from(pos)) - f64::from(u8::from(neg));
        let input = TickInput {
            move_x: axis(self.right, self.left),
            move_y: axis(self.up, self.down),
            rotate: axis(self.counter_clockwise, self.clockwise),
            precision: self.precision,
            action: self.action,
            final_action: self.final_action,
            pointer_pressed: self.pointer_pressed,
            autoplace: self.autoplace,
        };
        self.action = false;
        self.final_action = false;
        self.pointer_pressed = false;
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_lookup() {
        assert_eq!(intent_for_code("KeyW"), Some(Intent::Up));
        assert_eq!(intent_for_code("keyw"), Some(Intent::Up));
        assert_eq!(intent_for_code("ARROWLEFT"), Some(Intent::Clockwise));
        assert_eq!(intent_for_code("Enter"), Some(Intent::FinalAction));
        assert_eq!(intent_for_code("KeyZ"), None);
    }

    #[test]
    fn test_held_axes() {
        let mut input = InputState::new();
        input.key_down("KeyQ", false);
        input.key_down("KeyW", false);
        input.key_down("KeyA", false);
        let tick = input.snapshot();
        assert_eq!(tick.move_x, 1.0);
        assert_eq!(tick.move_y, 1.0);
        assert_eq!(tick.rotate, 1.0);

        // Held keys persist across snapshots
        assert_eq!(input.snapshot().move_y, 1.0);

        // Opposing keys cancel
        input.key_down("KeyS", false);
        assert_eq!(input.snapshot().move_y, 0.0);

        input.key_up("KeyW");
        input.key_up("KeyQ");
        input.key_down("KeyE", false);
        let tick = input.snapshot();
        assert_eq!(tick.move_y, -1.0);
        assert_eq!(tick.move_x, -1.0);
    }

    #[test]
    fn test_one_shots_consumed() {
        let mut input = InputState::new();
        input.key_down("Space", false);
        input.key_up("Space");
        input.pointer_down();
        let tick = input.snapshot();
        assert!(tick.action);
        assert!(tick.pointer_pressed);
        let tick = input.snapshot();
        assert!(!tick.action);
        assert!(!tick.pointer_pressed);
    }

    #[test]
    fn test_repeat_ignored() {
        let mut input = InputState::new();
        assert_eq!(input.key_down("Enter", true), None);
        assert!(!input.snapshot().final_action);
        assert_eq!(input.key_down("Enter", false), Some(Intent::FinalAction));
        assert!(input.snapshot().final_action);
    }

    #[test]
    fn test_clear_keeps_autoplace() {
        let mut input = InputState::new();
        input.autoplace = true;
        input.key_down("ShiftLeft", false);
        input.clear();
        let tick = input.snapshot();
        assert!(!tick.precision);
        assert!(tick.autoplace);
    }
}
