// src/db/connection.rs
//
// Connection pool over the single store file
//
// PRINCIPLES:
// - Every connection is opened up front; no degraded mode
// - No hidden connection creation
// - Clear error propagation
// - Leases only go out through the session layer

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};

/// Type alias for a pooled connection.
/// Dropping it hands the connection back to the pool.
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Fixed-size set of live connections to one store file
pub struct ConnectionPool {
    pool: Pool<SqliteConnectionManager>,
    path: PathBuf,
}

impl ConnectionPool {
    /// Open `config.pool_size` connections to `config.path`
    ///
    /// Per-connection setup:
    /// - Busy timeout so a checkpoint never surfaces as an immediate error
    /// - Foreign keys enabled
    /// - WAL mode so readers do not block on the file
    pub fn open(config: &DatabaseConfig) -> AppResult<Self> {
        config.validate()?;

        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let busy_timeout_ms = config.busy_timeout_ms;
        let manager = SqliteConnectionManager::file(&config.path).with_init(move |conn| {
            conn.execute_batch(&format!(
                "PRAGMA busy_timeout = {};
                 PRAGMA foreign_keys = ON;
                 PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;",
                busy_timeout_ms
            ))?;
            Ok(())
        });

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .min_idle(Some(config.pool_size))
            .connection_timeout(config.connection_timeout())
            .build(manager)
            .map_err(|e| {
                AppError::Pool(format!(
                    "Failed to open {} connection(s) to {}: {}",
                    config.pool_size,
                    config.path.display(),
                    e
                ))
            })?;

        log::info!(
            "Opened {} connection(s) to {}",
            config.pool_size,
            config.path.display()
        );

        Ok(Self {
            pool,
            path: config.path.clone(),
        })
    }

    /// Lease a connection, blocking until one is free.
    /// The lease ends when the returned value is dropped.
    pub(crate) fn acquire(&self) -> AppResult<PooledConn> {
        self.pool
            .get()
            .map_err(|e| AppError::Pool(format!("Failed to get database connection: {}", e)))
    }

    pub fn size(&self) -> u32 {
        self.pool.max_size()
    }

    /// Connections currently sitting in the pool
    pub fn idle(&self) -> u32 {
        self.pool.state().idle_connections
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Create a standalone connection (for testing)
///
/// This creates an in-memory database, useful for schema-only unit tests.
pub fn create_test_connection() -> AppResult<Connection> {
    let conn = Connection::open_in_memory()?;

    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &tempfile::TempDir, pool_size: u32) -> DatabaseConfig {
        DatabaseConfig {
            pool_size,
            ..DatabaseConfig::new(dir.path().join("catalog.db"))
        }
    }

    #[test]
    fn test_connection_pool_creation() {
        let dir = tempfile::tempdir().unwrap();
        let pool = ConnectionPool::open(&config_in(&dir, 3)).unwrap();
        assert_eq!(pool.size(), 3);

        let conn = pool.acquire().unwrap();

        let fk_enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk_enabled, 1);

        let journal: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(journal.to_lowercase(), "wal");
    }

    #[test]
    fn test_all_connections_opened_up_front() {
        let dir = tempfile::tempdir().unwrap();
        let pool = ConnectionPool::open(&config_in(&dir, 4)).unwrap();
        assert_eq!(pool.idle(), 4);
    }

    #[test]
    fn test_released_connection_returns_to_pool() {
        let dir = tempfile::tempdir().unwrap();
        let pool = ConnectionPool::open(&config_in(&dir, 2)).unwrap();

        {
            let _a = pool.acquire().unwrap();
            let _b = pool.acquire().unwrap();
            assert_eq!(pool.idle(), 0);
        }
        assert_eq!(pool.idle(), 2);
    }

    #[test]
    fn test_unopenable_store_fails_construction() {
        let dir = tempfile::tempdir().unwrap();
        // a directory is not a store file
        let config = DatabaseConfig {
            pool_size: 1,
            connection_timeout_secs: 1,
            ..DatabaseConfig::new(dir.path())
        };

        assert!(matches!(ConnectionPool::open(&config), Err(AppError::Pool(_))));
    }

    #[test]
    fn test_test_connection() {
        let conn = create_test_connection().unwrap();

        let result: i32 = conn
            .query_row("SELECT 1 + 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(result, 2);

        let fk_enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk_enabled, 1);
    }
}
