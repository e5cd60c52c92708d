// src/db/mod.rs
//
// Database module
//
// Provides:
// - Connection pooling
// - Reader/writer locking
// - Sessions and scoped transactions
// - Scoped constraint relaxation
// - Schema bootstrap and checks

pub mod connection;
pub mod constraints;
pub mod lock;
pub mod migrations;
pub mod session;

pub use connection::{create_test_connection, ConnectionPool, PooledConn};

pub use constraints::ConstraintRelaxation;

pub use lock::LockCoordinator;

pub use migrations::{
    get_database_stats, initialize_database, verify_database_integrity, DatabaseStats,
};

pub use session::{
    Database, ReadTransaction, Session, Transaction, TransactionKind, WriteTransaction,
};
