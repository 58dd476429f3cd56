use std::time::{Duration, Instant};

use crate::KeyBinding;

/// Key code of the drawing-mode shortcut (`D`).
pub const DRAW_KEY_CODE: u32 = 68;

/// Second finger tap must land in `[DOUBLE_TAP_MIN, DOUBLE_TAP_MAX)` after
/// the first. Faster taps are multi-finger gestures.
pub const DOUBLE_TAP_MIN: Duration = Duration::from_millis(100);
pub const DOUBLE_TAP_MAX: Duration = Duration::from_millis(500);

pub fn draw_key_binding() -> KeyBinding {
    KeyBinding {
        key_code: DRAW_KEY_CODE,
        key: "D".to_string(),
        description: "Enter drawing mode".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// The presentation's drawing-mode key binding fired
    DrawKey,
    KeyDown { key: String },
    DoubleClick,
    TouchStart { stylus: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputDisposition {
    /// Not for the overlay; let the presentation have it
    Ignored,

    /// Consumed; the overlay entered drawing mode
    Entered,

    /// Consumed; the overlay left drawing mode
    Left,
}

impl InputDisposition {
    pub fn is_consumed(&self) -> bool {
        !matches!(self, InputDisposition::Ignored)
    }
}

/// Decides when user input switches drawing mode on or off.
#[derive(Debug, Clone, Default)]
pub struct EditingGate {
    editing: bool,
    last_tap: Option<Instant>,
}

impl EditingGate {
    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn set_editing(&mut self, editing: bool) {
        self.editing = editing;
        self.last_tap = None;
    }

    pub fn handle(&mut self, event: &InputEvent, now: Instant) -> InputDisposition {
        let enter = match event {
            InputEvent::KeyDown { key } if self.editing && key == "Escape" => {
                self.set_editing(false);
                return InputDisposition::Left;
            }
            _ if self.editing => false,
            InputEvent::KeyDown { .. } => false,
            InputEvent::DrawKey | InputEvent::DoubleClick => true,
            InputEvent::TouchStart { stylus: true } => true,
            InputEvent::TouchStart { stylus: false } => self.finger_tap(now),
        };

        if enter {
            self.set_editing(true);
            InputDisposition::Entered
        } else {
            InputDisposition::Ignored
        }
    }

    fn finger_tap(&mut self, now: Instant) -> bool {
        let double = self.last_tap.is_some_and(|last| {
            let gap = now.saturating_duration_since(last);
            (DOUBLE_TAP_MIN..DOUBLE_TAP_MAX).contains(&gap)
        });
        self.last_tap = Some(now);
        double
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn escape_only_leaves_while_editing() {
        let mut gate = EditingGate::default();
        let now = Instant::now();
        let escape = InputEvent::KeyDown {
            key: "Escape".into(),
        };
        assert_eq!(gate.handle(&escape, now), InputDisposition::Ignored);

        assert_eq!(gate.handle(&InputEvent::DrawKey, now), InputDisposition::Entered);
        assert_eq!(gate.handle(&escape, now), InputDisposition::Left);
        assert!(!gate.is_editing());
    }

    #[test]
    fn double_click_and_stylus_enter() {
        let now = Instant::now();
        let mut gate = EditingGate::default();
        assert!(gate.handle(&InputEvent::DoubleClick, now).is_consumed());

        let mut gate = EditingGate::default();
        let stylus = InputEvent::TouchStart { stylus: true };
        assert_eq!(gate.handle(&stylus, now), InputDisposition::Entered);
        assert_eq!(gate.handle(&stylus, now), InputDisposition::Ignored);
    }

    #[test]
    fn finger_double_tap_window() {
        let t0 = Instant::now();
        let tap = InputEvent::TouchStart { stylus: false };

        let mut gate = EditingGate::default();
        assert_eq!(gate.handle(&tap, t0), InputDisposition::Ignored);
        assert_eq!(gate.handle(&tap, t0 + ms(50)), InputDisposition::Ignored);
        assert_eq!(gate.handle(&tap, t0 + ms(250)), InputDisposition::Entered);

        let mut gate = EditingGate::default();
        gate.handle(&tap, t0);
        assert_eq!(gate.handle(&tap, t0 + ms(500)), InputDisposition::Ignored);
        assert_eq!(gate.handle(&tap, t0 + ms(600)), InputDisposition::Entered);
    }

    #[test]
    fn draw_binding_uses_d() {
        let binding = draw_key_binding();
        assert_eq!((binding.key_code, binding.key.as_str()), (68, "D"));
    }
}
