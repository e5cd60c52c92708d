// src/config.rs
//
// Store configuration
//
// Everything the pool, the lock and the query engine need to know
// about the store lives here. Loaded from JSON or built in code.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Default maximum length (in characters) of stored entity names
pub const DEFAULT_MAX_NAME_LENGTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path of the single store file
    pub path: PathBuf,

    /// Number of physical connections, all opened up front
    pub pool_size: u32,

    /// How long a checkout waits for a free connection
    pub connection_timeout_secs: u64,

    /// SQLite busy timeout applied to every connection
    pub busy_timeout_ms: u64,

    /// Bounded wait on the reader/writer lock. `None` waits forever.
    pub lock_timeout_ms: Option<u64>,

    /// Names are truncated to this many characters on write and on lookup
    pub max_name_length: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("catalog.db"),
            pool_size: 10,
            connection_timeout_secs: 30,
            busy_timeout_ms: 5000,
            lock_timeout_ms: None,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
        }
    }
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(file: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(file)?;
        let config: DatabaseConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.pool_size == 0 {
            return Err(AppError::invalid_argument("pool_size must be at least 1"));
        }
        if self.max_name_length == 0 {
            return Err(AppError::invalid_argument(
                "max_name_length must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }
}

/// Get the default store path
///
/// Path structure: {APP_DATA}/catalogdb/catalog.db
pub fn default_database_path() -> AppResult<PathBuf> {
    let app_data_dir = dirs::data_dir()
        .ok_or_else(|| AppError::Other("Could not determine app data directory".to_string()))?;

    let catalog_dir = app_data_dir.join("catalogdb");
    std::fs::create_dir_all(&catalog_dir)?;

    Ok(catalog_dir.join("catalog.db"))
}
