//! Wiredboard Core Library
//!
//! Platform-agnostic data structures and logic for the Wiredboard whiteboard:
//! the element store, viewport math, link geometry, pointer drivers, session
//! persistence and the onboarding gate.

pub mod board;
pub mod color;
pub mod config;
pub mod elements;
pub mod geometry;
pub mod input;
pub mod interaction;
pub mod onboarding;
pub mod session;
pub mod storage;
pub mod viewport;

pub use board::{Board, Hit, Link, LinkToggle};
pub use color::{LinkColor, LinkColorError};
pub use config::{BoardConfig, ConfigError};
pub use elements::{Element, ElementId, ElementKind, ElementLayout, Height, HitRegion, ImageFormat, ResizeLimits};
pub use geometry::{EdgePoints, LinkArrow, intersect_line_with_rect, resolve_edge_points, to_board_space, zoom_at};
pub use input::{Modifiers, MouseButton, PointerEvent, WheelEvent, ZoomModifier};
pub use interaction::{DragSession, DriverState, ImportTicket, InteractionDriver, PointerOutcome};
pub use onboarding::{Answer, Onboarding, OnboardingError, OnboardingState};
pub use session::{SESSION_KEY_PREFIX, SessionError, SessionResult, SessionSnapshot, SessionStore};
pub use storage::{KeyValueStore, MemoryStorage, PlatformStorage, StorageError, StorageResult};
pub use viewport::{Viewport, ViewportController};
