//! Viewport state and controller for pan/zoom.

use crate::config::BoardConfig;
use crate::geometry;
use crate::input::{WheelEvent, ZoomModifier};
use kurbo::{Affine, Point, Vec2};

/// Smallest allowed scale.
pub const MIN_SCALE: f64 = 0.1;
/// Largest allowed scale.
pub const MAX_SCALE: f64 = 5.0;

/// The affine map from board space to screen space:
/// `screen = board * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f64,
    pub offset: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
        }
    }
}

impl Viewport {
    pub fn new(scale: f64, offset: Vec2) -> Self {
        Self { scale, offset }
    }

    /// Transform that converts board coordinates to screen coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    pub fn to_board(&self, screen_point: Point) -> Point {
        geometry::to_board_space(screen_point, self)
    }

    pub fn to_screen(&self, board_point: Point) -> Point {
        self.transform() * board_point
    }

    /// Convert a screen-space delta into a board-space delta.
    pub fn scale_delta(&self, screen_delta: Vec2) -> Vec2 {
        screen_delta / self.scale
    }

    /// Pan by a raw screen-space delta.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Owns the live viewport and applies the zoom policy to input.
#[derive(Debug, Clone)]
pub struct ViewportController {
    viewport: Viewport,
    min_scale: f64,
    max_scale: f64,
    /// Scale change per unit of wheel delta.
    sensitivity: f64,
    modifier: ZoomModifier,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::from_config(&BoardConfig::default())
    }
}

impl ViewportController {
    pub fn from_config(config: &BoardConfig) -> Self {
        Self {
            viewport: Viewport::default(),
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            sensitivity: config.wheel_zoom_sensitivity,
            modifier: config.zoom_modifier,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn scale(&self) -> f64 {
        self.viewport.scale
    }

    /// Replace the viewport wholesale (session load). The scale is clamped
    /// to the configured range here and nowhere else.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = Viewport {
            scale: viewport.scale.clamp(self.min_scale, self.max_scale),
            offset: viewport.offset,
        };
    }

    pub fn reset(&mut self) {
        self.viewport.reset();
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.viewport.pan(delta);
    }

    pub fn to_board(&self, screen_point: Point) -> Point {
        self.viewport.to_board(screen_point)
    }

    /// Zoom by `delta` around a screen point.
    pub fn zoom(&mut self, screen_point: Point, delta: f64) {
        self.viewport =
            geometry::zoom_at_within(screen_point, &self.viewport, delta, self.min_scale, self.max_scale);
    }

    /// Handle a wheel event. Returns true when the event zoomed the view and
    /// the platform's default scroll should be suppressed; events without the
    /// zoom modifier are left alone.
    pub fn handle_wheel(&mut self, event: &WheelEvent) -> bool {
        if !self.modifier.is_held(&event.modifiers) {
            return false;
        }
        let delta = -event.delta_y * self.sensitivity;
        self.zoom(event.position, delta);
        log::debug!("Zoomed to {:.3} at ({}, {})", self.viewport.scale, event.position.x, event.position.y);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;

    #[test]
    fn test_default_viewport() {
        let viewport = Viewport::default();
        assert_eq!(viewport.offset, Vec2::ZERO);
        assert!((viewport.scale - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let viewport = Viewport::new(1.5, Vec2::new(30.0, -20.0));
        let original = Point::new(123.0, 456.0);
        let back = viewport.to_screen(viewport.to_board(original));
        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }

    #[test]
    fn test_set_viewport_clamps_to_config() {
        let mut controller = ViewportController::default();
        controller.set_viewport(Viewport::new(50.0, Vec2::ZERO));
        assert!((controller.scale() - MAX_SCALE).abs() < f64::EPSILON);
        controller.set_viewport(Viewport::new(0.01, Vec2::ZERO));
        assert!((controller.scale() - MIN_SCALE).abs() < f64::EPSILON);

        let config = BoardConfig {
            max_scale: 10.0,
            ..BoardConfig::default()
        };
        let mut wide = ViewportController::from_config(&config);
        wide.set_viewport(Viewport::new(7.0, Vec2::new(3.0, 4.0)));
        assert!((wide.scale() - 7.0).abs() < f64::EPSILON);
        assert_eq!(wide.viewport().offset, Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_pan_is_unscaled() {
        let mut controller = ViewportController::default();
        controller.set_viewport(Viewport::new(2.0, Vec2::ZERO));
        controller.pan(Vec2::new(10.0, 20.0));
        assert_eq!(controller.viewport().offset, Vec2::new(10.0, 20.0));
    }

    #[test]
    fn test_wheel_without_modifier_is_ignored() {
        let mut controller = ViewportController::default();
        let event = WheelEvent {
            position: Point::new(100.0, 100.0),
            delta_y: -200.0,
            modifiers: Modifiers::default(),
        };
        assert!(!controller.handle_wheel(&event));
        assert_eq!(*controller.viewport(), Viewport::default());
    }

    #[test]
    fn test_wheel_with_modifier_zooms_in() {
        let mut controller = ViewportController::default();
        let event = WheelEvent {
            position: Point::new(100.0, 100.0),
            delta_y: -200.0,
            modifiers: Modifiers {
                shift: true,
                ..Modifiers::default()
            },
        };
        assert!(controller.handle_wheel(&event));
        assert!((controller.scale() - 1.2).abs() < 1e-12);
        let fixed = controller.to_board(Point::new(100.0, 100.0));
        assert!((fixed.x - 100.0).abs() < 1e-9);
        assert!((fixed.y - 100.0).abs() < 1e-9);
    }
}
