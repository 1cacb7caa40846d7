//! Link color stored as `#RRGGBB`.

use peniko::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing a hex color.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkColorError {
    #[error("Color must start with '#': {0}")]
    MissingHash(String),
    #[error("Color must have exactly six hex digits: {0}")]
    BadLength(String),
    #[error("Invalid hex digit in color: {0}")]
    BadDigit(String),
}

/// Opaque RGB color used for links and the linking highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LinkColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl LinkColor {
    pub const CYAN: Self = Self::new(0x00, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Format as `#RRGGBB` (upper-case digits).
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Default for LinkColor {
    fn default() -> Self {
        Self::CYAN
    }
}

impl FromStr for LinkColor {
    type Err = LinkColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| LinkColorError::MissingHash(s.to_string()))?;
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(LinkColorError::BadLength(s.to_string()));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(LinkColorError::BadDigit(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| LinkColorError::BadDigit(s.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for LinkColor {
    type Error = LinkColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LinkColor> for String {
    fn from(color: LinkColor) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for LinkColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<LinkColor> for Color {
    fn from(color: LinkColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, 255)
    }
}
