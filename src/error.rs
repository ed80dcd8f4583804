//! Error types for Constellation.
//!
//! The per-frame tick never fails; errors only come from building or loading
//! a configuration.

use std::fmt;

/// Errors that can occur while loading or validating a [`SimConfig`](crate::SimConfig).
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read or write the config file.
    Io(std::io::Error),
    /// The config file is not valid JSON for a `SimConfig`.
    Json(serde_json::Error),
    /// A palette color is not a `#rrggbb` hex string.
    InvalidColor(String),
    /// Palette colors and enable flags have different lengths.
    PaletteMismatch { colors: usize, enabled: usize },
    /// A value the simulation cannot run with.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to access config file: {}", e),
            ConfigError::Json(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::InvalidColor(text) => {
                write!(f, "Invalid color '{}', expected #rrggbb", text)
            }
            ConfigError::PaletteMismatch { colors, enabled } => write!(
                f,
                "Palette has {} colors but {} enable flags",
                colors, enabled
            ),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}
