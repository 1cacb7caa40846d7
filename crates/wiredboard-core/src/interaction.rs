//! Pointer-capture drivers: drag-move, drag-resize and pan.
//!
//! A press that qualifies starts exactly one [`DragSession`]; moves feed it
//! until the same button is released. Presses while a session is active are
//! ignored, so sessions never nest.

use crate::board::Board;
use crate::elements::{ElementId, ElementLayout, HitRegion};
use crate::input::{MouseButton, PointerEvent};
use crate::viewport::ViewportController;
use kurbo::{Point, Vec2};

/// The gesture being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragSession {
    /// Moving an element by its body.
    Move { id: ElementId },
    /// Resizing an element by its handle.
    Resize { id: ElementId },
    /// Panning the canvas.
    Pan,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DriverState {
    #[default]
    Idle,
    Active {
        session: DragSession,
        button: MouseButton,
        /// Last pointer sample in screen space.
        last: Point,
    },
}

/// What the platform layer should do with the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerOutcome {
    /// The event was consumed by a driver.
    pub handled: bool,
    /// Suppress the platform context menu for this press/release.
    pub suppress_context_menu: bool,
}

impl PointerOutcome {
    const IGNORED: Self = Self {
        handled: false,
        suppress_context_menu: false,
    };
    const HANDLED: Self = Self {
        handled: true,
        suppress_context_menu: false,
    };
}

/// Routes pointer events into drag sessions.
#[derive(Debug, Clone, Default)]
pub struct InteractionDriver {
    state: DriverState,
    layout: ElementLayout,
}

impl InteractionDriver {
    pub fn new(layout: ElementLayout) -> Self {
        Self {
            state: DriverState::Idle,
            layout,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, DriverState::Active { .. })
    }

    /// The active session, if any.
    pub fn session(&self) -> Option<DragSession> {
        match self.state {
            DriverState::Active { session, .. } => Some(session),
            DriverState::Idle => None,
        }
    }

    /// Drop any active session without applying further deltas.
    pub fn cancel(&mut self) {
        self.state = DriverState::Idle;
    }

    pub fn handle(
        &mut self,
        event: &PointerEvent,
        board: &mut Board,
        viewport: &mut ViewportController,
    ) -> PointerOutcome {
        match *event {
            PointerEvent::Down { position, button } => self.pointer_down(position, button, board, viewport),
            PointerEvent::Move { position } => self.pointer_move(position, board, viewport),
            PointerEvent::Up { button, .. } => self.pointer_up(button),
        }
    }

    pub fn pointer_down(
        &mut self,
        position: Point,
        button: MouseButton,
        board: &Board,
        viewport: &ViewportController,
    ) -> PointerOutcome {
        if self.is_active() {
            return PointerOutcome {
                handled: false,
                suppress_context_menu: button == MouseButton::Right,
            };
        }

        let session = match button {
            MouseButton::Right => DragSession::Pan,
            MouseButton::Left => {
                let board_point = viewport.to_board(position);
                match board.hit_test(board_point, self.layout) {
                    Some(hit) => match hit.region {
                        HitRegion::ResizeHandle => DragSession::Resize { id: hit.id },
                        HitRegion::Body => DragSession::Move { id: hit.id },
                        // Text fields keep the pointer for selection and focus.
                        HitRegion::TextInput => return PointerOutcome::IGNORED,
                    },
                    None => return PointerOutcome::IGNORED,
                }
            }
            MouseButton::Middle => return PointerOutcome::IGNORED,
        };

        log::debug!("Starting {:?} at ({}, {})", session, position.x, position.y);
        self.state = DriverState::Active {
            session,
            button,
            last: position,
        };
        PointerOutcome {
            handled: true,
            suppress_context_menu: button == MouseButton::Right,
        }
    }

    pub fn pointer_move(
        &mut self,
        position: Point,
        board: &mut Board,
        viewport: &mut ViewportController,
    ) -> PointerOutcome {
        let DriverState::Active { session, last, .. } = &mut self.state else {
            return PointerOutcome::IGNORED;
        };
        let screen_delta: Vec2 = position - *last;
        *last = position;

        match *session {
            DragSession::Move { id } => {
                let delta = viewport.viewport().scale_delta(screen_delta);
                board.move_element(id, delta);
            }
            DragSession::Resize { id } => {
                let delta = viewport.viewport().scale_delta(screen_delta);
                board.resize_element(id, delta);
            }
            DragSession::Pan => viewport.pan(screen_delta),
        }
        PointerOutcome::HANDLED
    }

    pub fn pointer_up(&mut self, button: MouseButton) -> PointerOutcome {
        match self.state {
            DriverState::Active {
                session,
                button: started_with,
                ..
            } if started_with == button => {
                log::debug!("Finished {:?}", session);
                self.state = DriverState::Idle;
                PointerOutcome {
                    handled: true,
                    suppress_context_menu: button == MouseButton::Right,
                }
            }
            _ => PointerOutcome {
                handled: false,
                suppress_context_menu: button == MouseButton::Right,
            },
        }
    }
}

/// Where a dropped image will land and which session it belongs to.
///
/// The position is fixed when the file is dropped, so later pans or zooms do
/// not move the element that the finished decode creates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportTicket {
    /// Board-space drop position.
    pub position: Point,
    /// Session generation at drop time.
    pub generation: u64,
}

impl ImportTicket {
    pub fn at_drop(screen_point: Point, viewport: &ViewportController, generation: u64) -> Self {
        Self {
            position: viewport.to_board(screen_point),
            generation,
        }
    }

    /// Whether the ticket still belongs to the live session.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ElementKind, Height};
    use crate::viewport::Viewport;

    fn setup() -> (InteractionDriver, Board, ViewportController, ElementId) {
        let mut board = Board::new();
        let id = board.add_element(ElementKind::note("a"), Point::new(0.0, 0.0), 160.0, Height::Fixed(100.0));
        (InteractionDriver::default(), board, ViewportController::default(), id)
    }

    fn down(position: Point, button: MouseButton) -> PointerEvent {
        PointerEvent::Down { position, button }
    }

    fn up(position: Point, button: MouseButton) -> PointerEvent {
        PointerEvent::Up { position, button }
    }

    fn moved(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Move {
            position: Point::new(x, y),
        }
    }

    #[test]
    fn test_drag_move_scaled() {
        let (mut driver, mut board, mut viewport, id) = setup();
        viewport.set_viewport(Viewport::new(2.0, Vec2::ZERO));

        // Footer strip of the note at scale 2: board y in 75..100.
        let start = Point::new(20.0, 170.0);
        assert!(driver.handle(&down(start, MouseButton::Left), &mut board, &mut viewport).handled);
        assert_eq!(driver.session(), Some(DragSession::Move { id }));

        driver.handle(&moved(21.0, 170.0), &mut board, &mut viewport);
        driver.handle(&moved(41.0, 190.0), &mut board, &mut viewport);
        let pos = board.get(id).unwrap().position;
        assert!((pos.x - 10.5).abs() < 1e-10);
        assert!((pos.y - 10.0).abs() < 1e-10);

        driver.handle(&up(Point::new(41.0, 190.0), MouseButton::Left), &mut board, &mut viewport);
        assert!(!driver.is_active());
        driver.handle(&moved(100.0, 100.0), &mut board, &mut viewport);
        assert!((board.get(id).unwrap().position.x - 10.5).abs() < 1e-10);
    }

    #[test]
    fn test_resize_handle_resizes_not_moves() {
        let (mut driver, mut board, mut viewport, id) = setup();
        let handle = Point::new(155.0, 95.0);
        driver.handle(&down(handle, MouseButton::Left), &mut board, &mut viewport);
        assert_eq!(driver.session(), Some(DragSession::Resize { id }));

        driver.handle(&moved(195.0, 115.0), &mut board, &mut viewport);
        let element = board.get(id).unwrap();
        assert_eq!(element.position, Point::ZERO);
        assert!((element.width - 200.0).abs() < 1e-10);
        assert_eq!(element.height, Height::Fixed(120.0));
    }

    #[test]
    fn test_text_input_press_ignored() {
        let (mut driver, mut board, mut viewport, _) = setup();
        let outcome = driver.handle(&down(Point::new(50.0, 30.0), MouseButton::Left), &mut board, &mut viewport);
        assert!(!outcome.handled);
        assert!(!driver.is_active());
    }

    #[test]
    fn test_empty_canvas_left_press_ignored() {
        let (mut driver, mut board, mut viewport, _) = setup();
        let outcome = driver.handle(&down(Point::new(900.0, 900.0), MouseButton::Left), &mut board, &mut viewport);
        assert!(!outcome.handled);
    }

    #[test]
    fn test_right_drag_pans_unscaled() {
        let (mut driver, mut board, mut viewport, id) = setup();
        viewport.set_viewport(Viewport::new(3.0, Vec2::ZERO));

        let outcome = driver.handle(&down(Point::new(50.0, 50.0), MouseButton::Right), &mut board, &mut viewport);
        assert!(outcome.handled);
        assert!(outcome.suppress_context_menu);

        driver.handle(&moved(80.0, 40.0), &mut board, &mut viewport);
        assert_eq!(viewport.viewport().offset, Vec2::new(30.0, -10.0));
        assert_eq!(board.get(id).unwrap().position, Point::ZERO);

        let outcome = driver.handle(&up(Point::new(80.0, 40.0), MouseButton::Right), &mut board, &mut viewport);
        assert!(outcome.handled);
        assert!(outcome.suppress_context_menu);
        assert!(!driver.is_active());
    }

    #[test]
    fn test_sessions_do_not_nest() {
        let (mut driver, mut board, mut viewport, id) = setup();
        driver.handle(&down(Point::new(20.0, 90.0), MouseButton::Left), &mut board, &mut viewport);
        let outcome = driver.handle(&down(Point::new(20.0, 90.0), MouseButton::Right), &mut board, &mut viewport);
        assert!(!outcome.handled);
        assert_eq!(driver.session(), Some(DragSession::Move { id }));

        // Releasing the other button does not end the session.
        driver.handle(&up(Point::new(20.0, 90.0), MouseButton::Right), &mut board, &mut viewport);
        assert!(driver.is_active());
        driver.handle(&up(Point::new(20.0, 90.0), MouseButton::Left), &mut board, &mut viewport);
        assert!(!driver.is_active());
    }

    #[test]
    fn test_deleted_element_mid_drag_is_noop() {
        let (mut driver, mut board, mut viewport, id) = setup();
        driver.handle(&down(Point::new(20.0, 90.0), MouseButton::Left), &mut board, &mut viewport);
        board.delete_element(id);
        let outcome = driver.handle(&moved(40.0, 120.0), &mut board, &mut viewport);
        assert!(outcome.handled);
        assert!(board.is_empty());
    }

    #[test]
    fn test_import_ticket_fixed_at_drop() {
        let mut viewport = ViewportController::default();
        viewport.set_viewport(Viewport::new(2.0, Vec2::new(100.0, 50.0)));
        let ticket = ImportTicket::at_drop(Point::new(300.0, 250.0), &viewport, 4);
        viewport.pan(Vec2::new(500.0, 500.0));
        assert_eq!(ticket.position, Point::new(100.0, 100.0));
        assert!(ticket.is_current(4));
        assert!(!ticket.is_current(5));
    }
}
