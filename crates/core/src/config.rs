//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Index store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IndexConfig {
    /// SQLite database file.
    Sqlite {
        /// Database file path.
        path: PathBuf,
        /// Busy timeout in seconds while waiting on a locked database.
        #[serde(default = "default_busy_timeout_secs")]
        busy_timeout_secs: u64,
    },
    /// Ephemeral in-memory SQLite database. Contents are lost on exit.
    Memory,
}

fn default_busy_timeout_secs() -> u64 {
    5
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/index.db"),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}

impl IndexConfig {
    /// Validate index configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            IndexConfig::Sqlite {
                path,
                busy_timeout_secs,
            } => {
                if path.as_os_str().is_empty() {
                    return Err("index.path must not be empty".to_string());
                }
                if *busy_timeout_secs == 0 {
                    return Err("index.busy_timeout_secs must be at least 1".to_string());
                }
                Ok(())
            }
            IndexConfig::Memory => Ok(()),
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter directive, overridden by `RUST_LOG` when set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Index store configuration.
    #[serde(default)]
    pub index: IndexConfig,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// Create a test configuration backed by an in-memory index.
    ///
    /// **For testing only.**
    pub fn for_testing() -> Self {
        Self {
            index: IndexConfig::Memory,
            log: LogConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.index.validate()
    }
}
