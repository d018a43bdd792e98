//! Engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `LEMBAR_PAGE_CACHE`: keep read pages in memory for the lifetime of a
//!   database handle (`true`/`false`/`1`/`0`, default: `true`)
//! - `LEMBAR_HISTORY_FILE`: where the interactive shell keeps its history
//!   (default: `.lembar_history`)

use std::path::PathBuf;

use thiserror::Error;

pub const PAGE_CACHE_VAR: &str = "LEMBAR_PAGE_CACHE";
pub const HISTORY_FILE_VAR: &str = "LEMBAR_HISTORY_FILE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub page_cache: bool,
    pub history_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_cache: true,
            history_file: PathBuf::from(Self::DEFAULT_HISTORY_FILE),
        }
    }
}

impl EngineConfig {
    pub const DEFAULT_HISTORY_FILE: &'static str = ".lembar_history";

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from any variable source. Unset variables fall
    /// back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let page_cache = match lookup(PAGE_CACHE_VAR) {
            Some(raw) => parse_flag(PAGE_CACHE_VAR, &raw)?,
            None => defaults.page_cache,
        };
        let history_file = match lookup(HISTORY_FILE_VAR) {
            Some(raw) if raw.trim().is_empty() => {
                return Err(ConfigError::InvalidValue {
                    name: HISTORY_FILE_VAR.to_string(),
                    message: "must not be empty".to_string(),
                });
            }
            Some(raw) => PathBuf::from(raw),
            None => defaults.history_file,
        };

        Ok(Self {
            page_cache,
            history_file,
        })
    }

    pub fn with_page_cache(mut self, enabled: bool) -> Self {
        self.page_cache = enabled;
        self
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("expected a boolean, got '{}'", other),
        }),
    }
}
