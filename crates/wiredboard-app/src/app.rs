//! Core application state and lifecycle.

use kurbo::Point;
use std::path::PathBuf;
use std::sync::Arc;
use wiredboard_core::board::{Board, Link, LinkToggle};
use wiredboard_core::color::LinkColor;
use wiredboard_core::config::{BoardConfig, ConfigError};
use wiredboard_core::elements::{ElementId, ElementKind, ElementLayout, Height, ResizeLimits};
use wiredboard_core::geometry::LinkArrow;
use wiredboard_core::interaction::{ImportTicket, InteractionDriver};
use wiredboard_core::onboarding::{self, Answer, Onboarding, OnboardingError, OnboardingState};
use wiredboard_core::session::{SessionError, SessionResult, SessionSnapshot, SessionStore};
use wiredboard_core::storage::KeyValueStore;
use wiredboard_core::viewport::{Viewport, ViewportController};

use crate::import::{CompletedImport, ImportQueue};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub board: BoardConfig,
    /// Width of the visible board area in screen pixels.
    pub viewport_width: f64,
    /// Storage directory for the native build; `None` uses the platform default.
    pub storage_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            board: BoardConfig::default(),
            viewport_width: 1280.0,
            storage_dir: None,
        }
    }
}

impl AppConfig {
    /// Defaults with board settings read from a JSON file.
    pub fn with_board_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        Ok(Self {
            board: BoardConfig::load(path)?,
            ..Self::default()
        })
    }

    fn limits(&self) -> ResizeLimits {
        ResizeLimits {
            min_width: self.board.min_width,
            min_height: self.board.min_note_height,
        }
    }

    pub(crate) fn layout(&self) -> ElementLayout {
        ElementLayout {
            footer_height: self.board.footer_height,
            handle_size: self.board.handle_size,
        }
    }
}

/// Message for the user about an action's outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// The whiteboard application: live board, viewport, sessions and onboarding.
pub struct App<S: KeyValueStore> {
    config: AppConfig,
    pub(crate) board: Board,
    pub(crate) viewport: ViewportController,
    pub(crate) driver: InteractionDriver,
    link_color: LinkColor,
    sessions: SessionStore<S>,
    onboarding: Onboarding<S>,
    current_session: String,
    /// Bumped whenever the live board is replaced; stale imports are dropped.
    generation: u64,
    imports: ImportQueue,
    notices: Vec<Notice>,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(storage: Arc<S>, config: AppConfig) -> Self {
        Self::with_time(storage, config, onboarding::now_ms())
    }

    /// Create the app as of `now` (epoch milliseconds).
    pub fn with_time(storage: Arc<S>, config: AppConfig, now: u64) -> Self {
        let onboarding = Onboarding::restore(storage.clone(), &config.board, now);
        let mut app = Self {
            board: Board::with_limits(config.limits()),
            viewport: ViewportController::from_config(&config.board),
            driver: InteractionDriver::new(config.layout()),
            link_color: config.board.default_link_color,
            sessions: SessionStore::new(storage),
            onboarding,
            current_session: config.board.default_session_name.clone(),
            generation: 0,
            imports: ImportQueue::new(),
            notices: Vec::new(),
            config,
        };
        if app.onboarding.is_board_unlocked() {
            app.open_current_session();
        }
        app
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn viewport(&self) -> &Viewport {
        self.viewport.viewport()
    }

    pub fn link_color(&self) -> LinkColor {
        self.link_color
    }

    pub fn current_session(&self) -> &str {
        &self.current_session
    }

    pub fn onboarding(&self) -> &Onboarding<S> {
        &self.onboarding
    }

    pub fn is_board_unlocked(&self) -> bool {
        self.onboarding.is_board_unlocked()
    }

    /// Update the visible width used for note placement.
    pub fn set_viewport_width(&mut self, width: f64) {
        self.config.viewport_width = width;
    }

    /// Drain messages queued for the user.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify_error(&mut self, message: String) {
        log::error!("{}", message);
        self.notices.push(Notice::Error(message));
    }

    fn notify_info(&mut self, message: String) {
        log::info!("{}", message);
        self.notices.push(Notice::Info(message));
    }

    // --- Board operations ---

    /// "Add Note": an empty note near the top centre of the view.
    pub fn add_note(&mut self) -> ElementId {
        let vp = self.viewport.viewport();
        let position = Point::new(
            (self.config.viewport_width / 2.0 - vp.offset.x) / vp.scale,
            (self.config.board.note_spawn_screen_y - vp.offset.y) / vp.scale,
        );
        self.add_note_at(position, "")
    }

    /// Add a note with default size at a board-space position.
    pub fn add_note_at(&mut self, position: Point, text: &str) -> ElementId {
        self.board.add_element(
            ElementKind::note(text),
            position,
            self.config.board.note_width,
            Height::Fixed(self.config.board.note_height),
        )
    }

    pub fn update_text(&mut self, id: ElementId, text: &str) {
        self.board.update_text(id, text);
    }

    pub fn delete_element(&mut self, id: ElementId) {
        self.board.delete_element(id);
    }

    pub fn toggle_link(&mut self, id: ElementId) -> LinkToggle {
        self.board.toggle_link(id)
    }

    pub fn set_link_color(&mut self, color: LinkColor) {
        self.link_color = color;
    }

    /// Arrows to draw over the board, in board space.
    pub fn link_arrows(&self) -> Vec<(Link, LinkArrow)> {
        self.board.link_arrows(self.config.board.arrow_head_size)
    }

    // --- Sessions ---

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(&self.board, self.viewport.viewport(), self.link_color)
    }

    /// Save the live board under `name`; on success it becomes the current session.
    pub fn save_session(&mut self, name: &str) -> SessionResult<()> {
        let name = name.trim();
        let snapshot = self.snapshot();
        match self.sessions.save(name, &snapshot) {
            Ok(()) => {
                self.current_session = name.to_string();
                self.notify_info(format!("Session \"{}\" saved", name));
                Ok(())
            }
            Err(e) => {
                self.notify_error(format!("Failed to save session: {}", e));
                Err(e)
            }
        }
    }

    /// Replace the live board with a stored session.
    ///
    /// A missing session leaves an empty board under the requested name; a
    /// corrupt one leaves an empty board under the previous name.
    pub fn load_session(&mut self, name: &str) -> SessionResult<()> {
        self.begin_replace();
        match self.sessions.load(name) {
            Ok(snapshot) => {
                self.board = snapshot.to_board(self.config.limits());
                self.viewport.set_viewport(snapshot.viewport);
                self.link_color = snapshot.link_color;
                self.current_session = name.to_string();
                self.notify_info(format!("Session \"{}\" loaded", name));
                Ok(())
            }
            Err(e @ SessionError::NotFound(_)) => {
                self.reset_board();
                self.current_session = name.to_string();
                self.notify_error(e.to_string());
                Err(e)
            }
            Err(e) => {
                self.reset_board();
                self.notify_error(format!("Failed to load session: {}", e));
                Err(e)
            }
        }
    }

    /// Start an empty board. A blank name becomes the untitled name.
    pub fn new_session(&mut self, name: &str) {
        self.begin_replace();
        self.reset_board();
        let name = name.trim();
        self.current_session = if name.is_empty() {
            self.config.board.untitled_session_name.clone()
        } else {
            name.to_string()
        };
        log::info!("New session \"{}\"", self.current_session);
    }

    /// Delete a stored session. Deleting the current one starts a fresh default session.
    pub fn delete_session(&mut self, name: &str) -> SessionResult<()> {
        if let Err(e) = self.sessions.delete(name) {
            self.notify_error(format!("Failed to delete session: {}", e));
            return Err(e);
        }
        self.notify_info(format!("Session \"{}\" deleted", name));
        if self.current_session == name {
            let default = self.config.board.default_session_name.clone();
            self.new_session(&default);
        }
        Ok(())
    }

    pub fn list_sessions(&self) -> SessionResult<Vec<String>> {
        self.sessions.list()
    }

    fn open_current_session(&mut self) {
        let name = self.current_session.clone();
        match self.sessions.exists(&name) {
            Ok(true) => {
                let _ = self.load_session(&name);
            }
            Ok(false) => log::info!("Starting with empty session \"{}\"", name),
            Err(e) => log::warn!("Could not check for session \"{}\": {}", name, e),
        }
    }

    fn begin_replace(&mut self) {
        self.generation += 1;
        self.driver.cancel();
        self.board.cancel_linking();
    }

    fn reset_board(&mut self) {
        self.board = Board::with_limits(self.config.limits());
        self.viewport.reset();
        self.link_color = self.config.board.default_link_color;
    }

    // --- Image import ---

    /// Start importing a dropped file. The landing position is fixed now.
    pub fn drop_file(&mut self, screen_point: Point, file_name: &str, mime: Option<String>, data: Vec<u8>) {
        let ticket = ImportTicket::at_drop(screen_point, &self.viewport, self.generation);
        self.imports.submit(ticket, file_name.to_string(), mime, data);
    }

    /// Decodes still running.
    pub fn pending_imports(&self) -> usize {
        self.imports.pending()
    }

    /// Apply finished decodes. Returns the number of images added.
    pub fn poll_imports(&mut self) -> usize {
        let done = self.imports.drain();
        self.apply_imports(done)
    }

    /// Wait for every running decode and apply the results.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn finish_imports(&mut self) -> usize {
        let done = self.imports.wait();
        self.apply_imports(done)
    }

    fn apply_imports(&mut self, done: Vec<CompletedImport>) -> usize {
        let mut added = 0;
        for completed in done {
            if !completed.ticket.is_current(self.generation) {
                log::warn!(
                    "Discarding {}: the session changed while it was decoding",
                    completed.file_name
                );
                continue;
            }
            match completed.result {
                Ok(image) => {
                    let id = self.board.add_element(
                        ElementKind::image(image.content),
                        completed.ticket.position,
                        self.config.board.image_width,
                        Height::Auto,
                    );
                    log::info!("Imported {} as {} ({:?})", completed.file_name, id, image.dimensions);
                    added += 1;
                }
                Err(e) => self.notify_error(format!("Could not import {}: {}", completed.file_name, e)),
            }
        }
        added
    }

    // --- Onboarding ---

    pub fn answer_onboarding(&mut self, answer: Answer, now: u64) -> Result<OnboardingState, OnboardingError> {
        self.onboarding.answer(answer, now)
    }

    /// Run timed work: onboarding transitions and finished imports.
    pub fn tick(&mut self, now: u64) {
        if self.onboarding.evaluate(now) && self.onboarding.is_board_unlocked() {
            self.open_current_session();
        }
        self.poll_imports();
    }

    /// Wipe onboarding progress and lock the board again.
    pub fn reset_onboarding(&mut self) {
        self.onboarding.reset();
        self.driver.cancel();
    }
}
