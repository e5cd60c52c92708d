// src/db/session.rs
//
// Sessions and scoped transactions
//
// PRINCIPLES:
// - Lock first, then connection; release in the reverse order
// - Every exit path releases both (Drop, not caller discipline)
// - One active transaction per session, no lock upgrade
// - Read transactions cannot write (query_only)

use rusqlite::Connection;
use std::cell::Cell;

use crate::config::DatabaseConfig;
use crate::db::connection::{ConnectionPool, PooledConn};
use crate::db::lock::{ExclusiveGuard, LockCoordinator, SharedGuard};
use crate::db::migrations::{
    get_database_stats, initialize_database, verify_database_integrity, DatabaseStats,
};
use crate::error::{AppError, AppResult};

/// The store: pool + lock + settings. Share it between threads
/// (behind an `Arc` or a scoped borrow); each thread opens its own
/// [`Session`].
pub struct Database {
    pool: ConnectionPool,
    lock: LockCoordinator,
    config: DatabaseConfig,
}

impl Database {
    /// Open the pool and bring the schema up to date
    pub fn open(config: DatabaseConfig) -> AppResult<Self> {
        let pool = ConnectionPool::open(&config)?;

        {
            let conn = pool.acquire()?;
            initialize_database(&conn)?;
        }

        let lock = LockCoordinator::new(config.lock_timeout());

        Ok(Self { pool, lock, config })
    }

    pub fn session(&self) -> Session<'_> {
        Session {
            db: self,
            active: Cell::new(None),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn stats(&self) -> AppResult<DatabaseStats> {
        self.session()
            .read(|tx| get_database_stats(tx.connection()))
    }

    pub fn verify_integrity(&self) -> AppResult<()> {
        self.session()
            .read(|tx| verify_database_integrity(tx.connection()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Read,
    Write,
}

/// What repositories need from an open transaction
pub trait Transaction {
    fn connection(&self) -> &Connection;

    /// Longest name, in characters, this store keeps
    fn max_name_length(&self) -> usize;
}

/// A calling context's handle on the store.
///
/// Not `Sync`: a session belongs to one thread. Transactions borrow
/// it, so nothing they return can outlive it.
pub struct Session<'db> {
    db: &'db Database,
    active: Cell<Option<TransactionKind>>,
}

impl<'db> Session<'db> {
    pub fn database(&self) -> &'db Database {
        self.db
    }

    pub fn active_transaction(&self) -> Option<TransactionKind> {
        self.active.get()
    }

    /// Shared lock + pooled connection, read-only
    pub fn begin_read(&self) -> AppResult<ReadTransaction<'_>> {
        let slot = self.claim(TransactionKind::Read)?;
        let lock = self.db.lock.shared()?;
        let conn = self.db.pool.acquire()?;

        let tx = ReadTransaction {
            conn,
            max_name_length: self.db.config.max_name_length,
            _lock: lock,
            _slot: slot,
        };
        tx.conn
            .execute_batch("PRAGMA query_only = ON; BEGIN DEFERRED;")?;

        Ok(tx)
    }

    /// Exclusive lock + pooled connection. Rolls back unless committed.
    pub fn begin_write(&self) -> AppResult<WriteTransaction<'_>> {
        let slot = self.claim(TransactionKind::Write)?;
        let lock = self.db.lock.exclusive()?;
        let conn = self.db.pool.acquire()?;

        let tx = WriteTransaction {
            conn,
            max_name_length: self.db.config.max_name_length,
            relaxed: Cell::new(false),
            _lock: lock,
            _slot: slot,
        };
        tx.conn.execute_batch("BEGIN IMMEDIATE")?;

        Ok(tx)
    }

    /// Run `f` inside a read transaction
    pub fn read<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&ReadTransaction<'_>) -> AppResult<T>,
    {
        let tx = self.begin_read()?;
        f(&tx)
    }

    /// Run `f` inside a write transaction.
    /// Commits on `Ok`, rolls back on `Err` or panic.
    pub fn write<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&WriteTransaction<'_>) -> AppResult<T>,
    {
        let tx = self.begin_write()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    fn claim(&self, kind: TransactionKind) -> AppResult<ActiveSlot<'_>> {
        match (self.active.get(), kind) {
            (None, _) => {
                self.active.set(Some(kind));
                Ok(ActiveSlot { slot: &self.active })
            }
            (Some(TransactionKind::Read), TransactionKind::Write) => Err(AppError::usage(
                "cannot open a write transaction while a read transaction is active on this session",
            )),
            (Some(active), requested) => Err(AppError::usage(format!(
                "cannot open a {:?} transaction inside an active {:?} transaction",
                requested, active
            ))),
        }
    }
}

/// Marks the session busy for as long as a transaction lives
struct ActiveSlot<'s> {
    slot: &'s Cell<Option<TransactionKind>>,
}

impl Drop for ActiveSlot<'_> {
    fn drop(&mut self) {
        self.slot.set(None);
    }
}

// Field order is drop order: connection back to the pool, then the
// lock, then the session slot.

pub struct ReadTransaction<'s> {
    conn: PooledConn,
    max_name_length: usize,
    _lock: SharedGuard<'s>,
    _slot: ActiveSlot<'s>,
}

impl Transaction for ReadTransaction<'_> {
    fn connection(&self) -> &Connection {
        &self.conn
    }

    fn max_name_length(&self) -> usize {
        self.max_name_length
    }
}

impl Drop for ReadTransaction<'_> {
    fn drop(&mut self) {
        if !self.conn.is_autocommit() {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                log::error!("Failed to end read transaction: {}", e);
            }
        }
        if let Err(e) = self.conn.execute_batch("PRAGMA query_only = OFF") {
            log::error!("Failed to restore query_only on pooled connection: {}", e);
        }
    }
}

pub struct WriteTransaction<'s> {
    pub(super) conn: PooledConn,
    max_name_length: usize,
    /// Constraint relaxation currently engaged
    pub(super) relaxed: Cell<bool>,
    _lock: ExclusiveGuard<'s>,
    _slot: ActiveSlot<'s>,
}

impl WriteTransaction<'_> {
    pub fn commit(self) -> AppResult<()> {
        self.conn.execute_batch("COMMIT")?;
        log::debug!("Committed write transaction");
        Ok(())
    }

    pub fn rollback(self) -> AppResult<()> {
        self.conn.execute_batch("ROLLBACK")?;
        log::debug!("Rolled back write transaction");
        Ok(())
    }
}

impl Transaction for WriteTransaction<'_> {
    fn connection(&self) -> &Connection {
        &self.conn
    }

    fn max_name_length(&self) -> usize {
        self.max_name_length
    }
}

impl Drop for WriteTransaction<'_> {
    fn drop(&mut self) {
        // still open: not committed, or COMMIT itself failed
        if !self.conn.is_autocommit() {
            match self.conn.execute_batch("ROLLBACK") {
                Ok(()) => log::debug!("Rolled back write transaction"),
                Err(e) => log::error!("Failed to roll back write transaction: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::time::Duration;

    fn open_db(dir: &tempfile::TempDir) -> Database {
        Database::open(DatabaseConfig {
            pool_size: 2,
            lock_timeout_ms: Some(50),
            ..DatabaseConfig::new(dir.path().join("catalog.db"))
        })
        .unwrap()
    }

    fn release_count(tx: &dyn Transaction) -> i64 {
        tx.connection()
            .query_row("SELECT COUNT(*) FROM release", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_write_commits_on_ok() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_db(&dir);
        let session = db.session();

        session
            .write(|tx| {
                tx.connection()
                    .execute("INSERT INTO release (name) VALUES ('Abbey Road')", [])?;
                Ok(())
            })
            .unwrap();

        let count = session.read(|tx| Ok(release_count(tx))).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_write_rolls_back_on_err() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_db(&dir);
        let session = db.session();

        let result: AppResult<()> = session.write(|tx| {
            tx.connection()
                .execute("INSERT INTO release (name) VALUES ('Abbey Road')", [])?;
            Err(AppError::Other("scan aborted".to_string()))
        });
        assert!(result.is_err());

        let count = session.read(|tx| Ok(release_count(tx))).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_dropped_write_guard_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_db(&dir);
        let session = db.session();

        {
            let tx = session.begin_write().unwrap();
            tx.connection()
                .execute("INSERT INTO release (name) VALUES ('Abbey Road')", [])
                .unwrap();
        }

        let count = session.read(|tx| Ok(release_count(tx))).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_read_transaction_cannot_write() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_db(&dir);
        let session = db.session();

        let result = session.read(|tx| {
            tx.connection()
                .execute("INSERT INTO release (name) VALUES ('Abbey Road')", [])?;
            Ok(())
        });
        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[test]
    fn test_query_only_reset_after_read() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(DatabaseConfig {
            pool_size: 1,
            ..DatabaseConfig::new(dir.path().join("catalog.db"))
        })
        .unwrap();
        let session = db.session();

        session.read(|_| Ok(())).unwrap();

        // the single pooled connection must be writable again
        session
            .write(|tx| {
                let query_only: i64 =
                    tx.connection()
                        .query_row("PRAGMA query_only", [], |row| row.get(0))?;
                assert_eq!(query_only, 0);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_lock_upgrade_is_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_db(&dir);
        let session = db.session();

        let _read = session.begin_read().unwrap();
        let err = session.begin_write().err().unwrap();
        assert!(matches!(err, AppError::Usage(_)));
    }

    #[test]
    fn test_nested_transactions_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_db(&dir);
        let session = db.session();

        {
            let _write = session.begin_write().unwrap();
            assert!(matches!(session.begin_read(), Err(AppError::Usage(_))));
            assert!(matches!(session.begin_write(), Err(AppError::Usage(_))));
        }
        {
            let _read = session.begin_read().unwrap();
            assert!(matches!(session.begin_read(), Err(AppError::Usage(_))));
        }
    }

    #[test]
    fn test_session_free_after_transaction_ends() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_db(&dir);
        let session = db.session();

        let _ = session.read(|_| -> AppResult<()> { Err(AppError::NotFound) });
        assert_eq!(session.active_transaction(), None);
        assert!(session.begin_write().is_ok());
    }

    #[test]
    fn test_resources_released_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_db(&dir);
        let session = db.session();

        let _ = session.write(|tx| -> AppResult<()> {
            tx.connection().execute("INSERT INTO nowhere VALUES (1)", [])?;
            Ok(())
        });

        assert_eq!(db.pool().idle(), 2);
        assert!(!db.lock.is_exclusively_held());
    }

    fn open_single_connection_db(dir: &tempfile::TempDir) -> Database {
        Database::open(DatabaseConfig {
            pool_size: 1,
            lock_timeout_ms: Some(50),
            ..DatabaseConfig::new(dir.path().join("catalog.db"))
        })
        .unwrap()
    }

    #[test]
    fn test_panic_in_write_rolls_back_and_releases() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_single_connection_db(&dir);
        let session = db.session();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            session.write(|tx| -> AppResult<()> {
                tx.connection()
                    .execute("INSERT INTO release (name) VALUES ('Abbey Road')", [])?;
                panic!("scanner crashed mid-write");
            })
        }));
        assert!(outcome.is_err());

        assert_eq!(db.pool().idle(), 1);
        assert!(!db.lock.is_exclusively_held());
        assert_eq!(session.active_transaction(), None);

        let count = session.read(|tx| Ok(release_count(tx))).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_panic_in_read_releases_and_resets_query_only() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_single_connection_db(&dir);
        let session = db.session();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            session.read(|_| -> AppResult<()> { panic!("renderer crashed mid-read") })
        }));
        assert!(outcome.is_err());

        assert_eq!(db.pool().idle(), 1);
        assert_eq!(session.active_transaction(), None);

        // the write lock is free and the only connection is writable again
        session
            .write(|tx| {
                let query_only: i64 =
                    tx.connection()
                        .query_row("PRAGMA query_only", [], |row| row.get(0))?;
                assert_eq!(query_only, 0);
                tx.connection()
                    .execute("INSERT INTO release (name) VALUES ('Abbey Road')", [])?;
                Ok(())
            })
            .unwrap();
        assert_eq!(session.read(|tx| Ok(release_count(tx))).unwrap(), 1);
    }

    #[test]
    fn test_transactions_carry_store_name_limit() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(DatabaseConfig {
            max_name_length: 16,
            ..DatabaseConfig::new(dir.path().join("catalog.db"))
        })
        .unwrap();
        let session = db.session();

        assert_eq!(session.read(|tx| Ok(tx.max_name_length())).unwrap(), 16);
        assert_eq!(session.write(|tx| Ok(tx.max_name_length())).unwrap(), 16);
    }

    #[test]
    fn test_reader_times_out_behind_writer() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_db(&dir);
        let first = db.session();
        let second = db.session();

        let _write = first.begin_write().unwrap();
        match second.begin_read() {
            Err(AppError::LockTimeout(t)) => assert_eq!(t, Duration::from_millis(50)),
            other => panic!("expected lock timeout, got {:?}", other.err()),
        }
        // the failed attempt must not mark the session busy
        assert_eq!(second.active_transaction(), None);
    }

    #[test]
    fn test_stats_and_integrity() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_db(&dir);

        let stats = db.stats().unwrap();
        assert_eq!(stats.release_count, 0);
        db.verify_integrity().unwrap();
    }
}
