//! Named board snapshots persisted in a key-value store.

mod record;

pub use record::{ElementRecord, SessionRecord, ViewportRecord};

use crate::board::{Board, Link};
use crate::color::LinkColor;
use crate::elements::{Element, ResizeLimits};
use crate::storage::{KeyValueStore, StorageError};
use crate::viewport::Viewport;
use std::sync::Arc;
use thiserror::Error;

/// Prefix of every session key in the store.
pub const SESSION_KEY_PREFIX: &str = "board_session_";

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session \"{0}\" not found")]
    NotFound(String),
    #[error("Session \"{name}\" is corrupt: {reason}")]
    Corrupt { name: String, reason: String },
    #[error("Session name must not be empty")]
    InvalidName,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Everything a session stores.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Elements in paint order.
    pub elements: Vec<Element>,
    pub links: Vec<Link>,
    pub viewport: Viewport,
    pub link_color: LinkColor,
}

impl SessionSnapshot {
    /// Capture the live state.
    pub fn capture(board: &Board, viewport: &Viewport, link_color: LinkColor) -> Self {
        Self {
            elements: board
                .elements_ordered()
                .cloned()
                .map(|mut element| {
                    element.is_linking = false;
                    element
                })
                .collect(),
            links: board.links().to_vec(),
            viewport: *viewport,
            link_color,
        }
    }

    /// Rebuild a board from this snapshot.
    pub fn to_board(&self, limits: ResizeLimits) -> Board {
        Board::from_parts(self.elements.clone(), self.links.clone(), limits)
    }

    fn to_record(&self) -> SessionRecord {
        SessionRecord {
            elements: self.elements.iter().map(ElementRecord::from).collect(),
            links: self.links.clone(),
            viewport: ViewportRecord::from(&self.viewport),
            link_color: self.link_color,
        }
    }

    fn from_record(record: SessionRecord) -> Result<Self, String> {
        let elements = record
            .elements
            .into_iter()
            .map(Element::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            elements,
            links: record.links,
            viewport: Viewport::try_from(record.viewport)?,
            link_color: record.link_color,
        })
    }

    /// Serialize to the stored JSON form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_record())
    }

    /// Parse the stored JSON form.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let record: SessionRecord = serde_json::from_str(json).map_err(|e| e.to_string())?;
        Self::from_record(record)
    }
}

fn session_key(name: &str) -> String {
    format!("{SESSION_KEY_PREFIX}{name}")
}

/// Save/load/list/delete of named sessions.
pub struct SessionStore<S: KeyValueStore> {
    storage: Arc<S>,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Save a snapshot, overwriting any session with the same name.
    pub fn save(&self, name: &str, snapshot: &SessionSnapshot) -> SessionResult<()> {
        if name.trim().is_empty() {
            return Err(SessionError::InvalidName);
        }
        let json = snapshot
            .to_json()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.storage.set(&session_key(name), &json)?;
        log::info!("Saved session \"{}\" ({} elements, {} links)", name, snapshot.elements.len(), snapshot.links.len());
        Ok(())
    }

    /// Load a snapshot by name.
    pub fn load(&self, name: &str) -> SessionResult<SessionSnapshot> {
        let json = self
            .storage
            .get(&session_key(name))?
            .ok_or_else(|| SessionError::NotFound(name.to_string()))?;
        SessionSnapshot::from_json(&json).map_err(|reason| SessionError::Corrupt {
            name: name.to_string(),
            reason,
        })
    }

    /// Names of all stored sessions, sorted.
    pub fn list(&self) -> SessionResult<Vec<String>> {
        let mut names: Vec<String> = self
            .storage
            .keys()?
            .into_iter()
            .filter_map(|key| key.strip_prefix(SESSION_KEY_PREFIX).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn delete(&self, name: &str) -> SessionResult<()> {
        self.storage.remove(&session_key(name))?;
        log::info!("Deleted session \"{}\"", name);
        Ok(())
    }

    pub fn exists(&self, name: &str) -> SessionResult<bool> {
        Ok(self.storage.get(&session_key(name))?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ElementKind, Height};
    use crate::storage::MemoryStorage;
    use kurbo::{Point, Vec2};

    fn sample_board() -> Board {
        let mut board = Board::new();
        let a = board.add_element(ElementKind::note("first"), Point::new(0.0, 0.0), 160.0, Height::Fixed(100.0));
        let b = board.add_element(
            ElementKind::image("data:image/png;base64,iVBORw=="),
            Point::new(400.0, 10.0),
            200.0,
            Height::Auto,
        );
        let c = board.add_element(ElementKind::note("third"), Point::new(-300.5, 80.25), 90.0, Height::Fixed(61.0));
        board.toggle_link(a);
        board.toggle_link(b);
        board.toggle_link(c);
        board.toggle_link(a);
        board
    }

    #[test]
    fn test_save_load_roundtrip() {
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        let board = sample_board();
        let viewport = Viewport::new(1.75, Vec2::new(-42.0, 13.5));
        let color = LinkColor::new(0x12, 0xAB, 0xEF);
        let saved = SessionSnapshot::capture(&board, &viewport, color);

        store.save("work", &saved).unwrap();
        let loaded = store.load("work").unwrap();
        assert_eq!(loaded, saved);

        let restored = loaded.to_board(ResizeLimits::default());
        assert_eq!(SessionSnapshot::capture(&restored, &loaded.viewport, loaded.link_color), saved);
    }

    #[test]
    fn test_roundtrip_keeps_drag_coordinates_exact() {
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        for k in 0..500 {
            let scale = 0.1 + k as f64 / 1000.0 + 1.0 / 3.0;
            let mut board = Board::new();
            let id = board.add_element(ElementKind::note("drag"), Point::new(10.0, 20.0), 160.0, Height::Fixed(100.0));
            board.move_element(id, Vec2::new(17.0 + k as f64, 11.0) / scale);
            board.resize_element(id, Vec2::new(7.0, 3.0 + k as f64) / scale);
            let viewport = Viewport::new(scale, Vec2::new(-31.0, 5.0 + k as f64) / scale);
            let saved = SessionSnapshot::capture(&board, &viewport, LinkColor::CYAN);

            store.save("drag", &saved).unwrap();
            assert_eq!(store.load("drag").unwrap(), saved, "scale {}", scale);
        }
    }

    #[test]
    fn test_save_overwrites() {
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        let empty = SessionSnapshot::capture(&Board::new(), &Viewport::default(), LinkColor::CYAN);
        let full = SessionSnapshot::capture(&sample_board(), &Viewport::default(), LinkColor::CYAN);
        store.save("s", &full).unwrap();
        store.save("s", &empty).unwrap();
        assert!(store.load("s").unwrap().elements.is_empty());
        assert_eq!(store.list().unwrap(), vec!["s".to_string()]);
    }

    #[test]
    fn test_not_found() {
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        assert!(matches!(store.load("nope"), Err(SessionError::NotFound(name)) if name == "nope"));
    }

    #[test]
    fn test_corrupt() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set("board_session_bad", "{ not json").unwrap();
        storage.set("board_session_worse", r#"{"elements":[{"id":"x"}]}"#).unwrap();
        let store = SessionStore::new(storage);
        assert!(matches!(store.load("bad"), Err(SessionError::Corrupt { .. })));
        assert!(matches!(store.load("worse"), Err(SessionError::Corrupt { .. })));
    }

    #[test]
    fn test_list_filters_prefix_and_sorts() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set("onboarding_completed", "true").unwrap();
        let store = SessionStore::new(storage);
        let snapshot = SessionSnapshot::capture(&Board::new(), &Viewport::default(), LinkColor::CYAN);
        store.save("zeta", &snapshot).unwrap();
        store.save("Alpha", &snapshot).unwrap();
        store.save("beta", &snapshot).unwrap();
        assert_eq!(store.list().unwrap(), vec!["Alpha", "beta", "zeta"]);
    }

    #[test]
    fn test_delete() {
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        let snapshot = SessionSnapshot::capture(&Board::new(), &Viewport::default(), LinkColor::CYAN);
        store.save("gone", &snapshot).unwrap();
        assert!(store.exists("gone").unwrap());
        store.delete("gone").unwrap();
        assert!(!store.exists("gone").unwrap());
    }

    #[test]
    fn test_blank_name_rejected() {
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        let snapshot = SessionSnapshot::capture(&Board::new(), &Viewport::default(), LinkColor::CYAN);
        assert!(matches!(store.save("   ", &snapshot), Err(SessionError::InvalidName)));
    }

    #[test]
    fn test_quota_failure_is_reported() {
        let store = SessionStore::new(Arc::new(MemoryStorage::with_quota(64)));
        let snapshot = SessionSnapshot::capture(&sample_board(), &Viewport::default(), LinkColor::CYAN);
        assert!(matches!(
            store.save("big", &snapshot),
            Err(SessionError::Storage(StorageError::QuotaExceeded(_)))
        ));
        assert!(!store.exists("big").unwrap());
    }
}
