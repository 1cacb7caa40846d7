//! Board configuration.
//!
//! Every tunable number the board uses lives here so the shell can load
//! overrides from JSON. Missing fields fall back to their defaults.

use crate::color::LinkColor;
use crate::input::ZoomModifier;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("Invalid config: {0}")]
    Parse(String),
}

/// Tunable parameters for the board, drivers and onboarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Width of a freshly added note.
    pub note_width: f64,
    /// Height of a freshly added note.
    pub note_height: f64,
    /// Width of a freshly imported image.
    pub image_width: f64,
    /// Resize floor for element width.
    pub min_width: f64,
    /// Resize floor for note height.
    pub min_note_height: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Scale change per unit of wheel delta.
    pub wheel_zoom_sensitivity: f64,
    /// Modifier that must be held for the wheel to zoom.
    pub zoom_modifier: ZoomModifier,
    pub default_link_color: LinkColor,
    /// Session loaded on startup.
    pub default_session_name: String,
    /// Name given to a new session created without a name.
    pub untitled_session_name: String,
    /// Arrowhead length in board units.
    pub arrow_head_size: f64,
    /// Height of the button strip at the bottom of every element.
    pub footer_height: f64,
    /// Side of the square resize handle.
    pub handle_size: f64,
    /// Screen-space y at which "Add Note" places new notes.
    pub note_spawn_screen_y: f64,
    /// How long a negative answer locks onboarding, in milliseconds.
    pub onboarding_block_ms: u64,
    /// How long the final greeting stays up, in milliseconds.
    pub greeting_dwell_ms: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            note_width: 160.0,
            note_height: 100.0,
            image_width: 200.0,
            min_width: 80.0,
            min_note_height: 60.0,
            min_scale: 0.1,
            max_scale: 5.0,
            wheel_zoom_sensitivity: 0.001,
            zoom_modifier: ZoomModifier::Shift,
            default_link_color: LinkColor::CYAN,
            default_session_name: "Default Session".to_string(),
            untitled_session_name: "Untitled Session".to_string(),
            arrow_head_size: 8.0,
            footer_height: 25.0,
            handle_size: 10.0,
            note_spawn_screen_y: 100.0,
            onboarding_block_ms: 30 * 60 * 1000,
            greeting_dwell_ms: 2000,
        }
    }
}

impl BoardConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_scale > 0.0 && self.min_scale <= self.max_scale) {
            return Err(ConfigError::Parse(format!(
                "scale bounds must satisfy 0 < min <= max (got {}..{})",
                self.min_scale, self.max_scale
            )));
        }
        if self.min_width <= 0.0 || self.min_note_height <= 0.0 {
            return Err(ConfigError::Parse("resize floors must be positive".to_string()));
        }
        Ok(())
    }
}
