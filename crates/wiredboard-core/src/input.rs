//! Input events delivered by the platform layer.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Which modifier turns the wheel into a zoom gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomModifier {
    #[default]
    Shift,
    Ctrl,
    Alt,
    Meta,
}

impl ZoomModifier {
    pub fn is_held(&self, modifiers: &Modifiers) -> bool {
        match self {
            ZoomModifier::Shift => modifiers.shift,
            ZoomModifier::Ctrl => modifiers.ctrl,
            ZoomModifier::Alt => modifiers.alt,
            ZoomModifier::Meta => modifiers.meta,
        }
    }
}

/// Pointer event in screen coordinates (relative to the board's top-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point, button: MouseButton },
    Up { position: Point, button: MouseButton },
    Move { position: Point },
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Move { position } => *position,
        }
    }
}

/// Mouse wheel event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelEvent {
    pub position: Point,
    /// Vertical wheel delta; negative scrolls up (zooms in).
    pub delta_y: f64,
    pub modifiers: Modifiers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_modifier() {
        let shift = Modifiers {
            shift: true,
            ..Modifiers::default()
        };
        assert!(ZoomModifier::Shift.is_held(&shift));
        assert!(!ZoomModifier::Ctrl.is_held(&shift));
        assert!(!ZoomModifier::Shift.is_held(&Modifiers::default()));
    }

    #[test]
    fn test_zoom_modifier_serde() {
        let m: ZoomModifier = serde_json::from_str("\"ctrl\"").unwrap();
        assert_eq!(m, ZoomModifier::Ctrl);
    }
}
