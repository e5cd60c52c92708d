// src/test_utils.rs
//
// Shared fixtures for pool-backed unit tests. An in-memory store cannot
// be shared between pooled connections, so every fixture gets a file
// in its own temporary directory.

use tempfile::TempDir;

use crate::config::DatabaseConfig;
use crate::db::Database;

pub struct TestDatabase {
    pub db: Database,
    // keeps the directory alive as long as the database
    _dir: TempDir,
}

pub fn open_test_database() -> TestDatabase {
    open_test_database_with(|config| config)
}

pub fn open_test_database_with(
    adjust: impl FnOnce(DatabaseConfig) -> DatabaseConfig,
) -> TestDatabase {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = adjust(DatabaseConfig {
        pool_size: 4,
        ..DatabaseConfig::new(dir.path().join("catalog.db"))
    });
    let db = Database::open(config).expect("open test database");
    TestDatabase { db, _dir: dir }
}
