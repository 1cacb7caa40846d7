//! Event handling: routes platform input into drivers, zoom and import.

use kurbo::Point;
use wiredboard_core::input::{PointerEvent, WheelEvent};
use wiredboard_core::storage::KeyValueStore;

use crate::app::App;

/// Input delivered by the platform layer, in screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    Pointer(PointerEvent),
    Wheel(WheelEvent),
    /// A file dropped onto the board.
    Drop {
        position: Point,
        file_name: String,
        mime: Option<String>,
        data: Vec<u8>,
    },
}

/// What the platform layer should do after dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventResponse {
    pub handled: bool,
    /// Cancel the platform default (page scroll, file open).
    pub prevent_default: bool,
    pub suppress_context_menu: bool,
}

impl<S: KeyValueStore> App<S> {
    /// Dispatch one input event. Nothing reaches the board until onboarding is done.
    pub fn handle_event(&mut self, event: BoardEvent) -> EventResponse {
        if !self.is_board_unlocked() {
            log::debug!("Board locked, ignoring {} event", event_name(&event));
            return EventResponse::default();
        }

        match event {
            BoardEvent::Pointer(pointer) => {
                let outcome = self.driver.handle(&pointer, &mut self.board, &mut self.viewport);
                EventResponse {
                    handled: outcome.handled,
                    prevent_default: outcome.handled,
                    suppress_context_menu: outcome.suppress_context_menu,
                }
            }
            BoardEvent::Wheel(wheel) => {
                let zoomed = self.viewport.handle_wheel(&wheel);
                EventResponse {
                    handled: zoomed,
                    prevent_default: zoomed,
                    suppress_context_menu: false,
                }
            }
            BoardEvent::Drop {
                position,
                file_name,
                mime,
                data,
            } => {
                self.drop_file(position, &file_name, mime, data);
                EventResponse {
                    handled: true,
                    prevent_default: true,
                    suppress_context_menu: false,
                }
            }
        }
    }
}

fn event_name(event: &BoardEvent) -> &'static str {
    match event {
        BoardEvent::Pointer(_) => "pointer",
        BoardEvent::Wheel(_) => "wheel",
        BoardEvent::Drop { .. } => "drop",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppConfig;
    use crate::app::tests::unlocked_storage;
    use std::sync::Arc;
    use wiredboard_core::input::{Modifiers, MouseButton};
    use wiredboard_core::storage::MemoryStorage;

    fn wheel(delta_y: f64, shift: bool) -> BoardEvent {
        BoardEvent::Wheel(WheelEvent {
            position: Point::new(500.0, 300.0),
            delta_y,
            modifiers: Modifiers {
                shift,
                ..Modifiers::default()
            },
        })
    }

    #[test]
    fn test_locked_board_ignores_input() {
        let mut app = App::with_time(Arc::new(MemoryStorage::new()), AppConfig::default(), 0);
        let response = app.handle_event(wheel(-200.0, true));
        assert!(!response.handled);
        assert!((app.viewport().scale - 1.0).abs() < f64::EPSILON);

        let response = app.handle_event(BoardEvent::Pointer(PointerEvent::Down {
            position: Point::ZERO,
            button: MouseButton::Right,
        }));
        assert_eq!(response, EventResponse::default());
    }

    #[test]
    fn test_wheel_needs_modifier() {
        let mut app = App::with_time(unlocked_storage(), AppConfig::default(), 0);
        let response = app.handle_event(wheel(-200.0, false));
        assert!(!response.handled);
        assert!(!response.prevent_default);
        assert!((app.viewport().scale - 1.0).abs() < f64::EPSILON);

        let response = app.handle_event(wheel(-200.0, true));
        assert!(response.prevent_default);
        assert!((app.viewport().scale - 1.2).abs() < 1e-10);
        let anchor = app.viewport().to_board(Point::new(500.0, 300.0));
        assert!((anchor.x - 500.0).abs() < 1e-9);
        assert!((anchor.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_right_drag_through_app() {
        let mut app = App::with_time(unlocked_storage(), AppConfig::default(), 0);
        let down = app.handle_event(BoardEvent::Pointer(PointerEvent::Down {
            position: Point::new(10.0, 10.0),
            button: MouseButton::Right,
        }));
        assert!(down.suppress_context_menu);
        app.handle_event(BoardEvent::Pointer(PointerEvent::Move {
            position: Point::new(25.0, 5.0),
        }));
        app.handle_event(BoardEvent::Pointer(PointerEvent::Up {
            position: Point::new(25.0, 5.0),
            button: MouseButton::Right,
        }));
        assert_eq!(app.viewport().offset, kurbo::Vec2::new(15.0, -5.0));
    }
}
