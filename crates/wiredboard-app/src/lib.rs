//! Wiredboard Application
//!
//! The application shell: input dispatch, sessions, onboarding gate and
//! image import on top of `wiredboard-core`.

mod app;
mod event_handler;
mod import;

pub use app::{App, AppConfig, Notice};
pub use event_handler::{BoardEvent, EventResponse};
pub use import::{CompletedImport, DecodedImage, ImportError, ImportQueue, decode_image};

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{WebBoard, WebResponse, run_wasm};
