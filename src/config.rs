//! Configuration for relq
//!
//! Parses `relq.toml`:
//!
//! ```toml
//! dialect = "sqlite"
//! casing = "snake_case"
//! logger = true
//! ```

use std::path::{Path, PathBuf};

use relq_core::Casing;
use relq_types::Dialect;
use serde::Deserialize;

/// Default config filename
pub const CONFIG_FILE: &str = "relq.toml";

// ============================================================================
// Config
// ============================================================================

/// Facade settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Dialect queries are rendered for
    pub dialect: Dialect,
    /// Key-to-column-name mapping applied when the schema is finalized
    pub casing: Casing,
    /// Log every executed statement at info level
    pub logger: bool,
}

impl Config {
    /// Load from default config file
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Load from specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.into())
            } else {
                ConfigError::Io(path.into(), e)
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(path.into(), e))
    }

    /// Parse an in-memory TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),
}

// ============================================================================
// Tests
// ============================================================================
