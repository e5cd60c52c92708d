// src/lib.rs
// CatalogDb - data-access core of a personal music library server
//
// Architecture:
// - One store file, a fixed pool of connections, one process-wide RW lock
// - Sessions hand out scoped read/write transactions over that pool
// - Repositories run explicit SQL inside a caller-supplied transaction
// - Services compose repositories into whole-transaction workflows

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod repositories;
pub mod services;

#[cfg(test)]
mod test_utils;

// ============================================================================
// PUBLIC API - Configuration
// ============================================================================

pub use config::{default_database_path, DatabaseConfig, DEFAULT_MAX_NAME_LENGTH};

// ============================================================================
// PUBLIC API - Domain Entities
// ============================================================================

pub use domain::{
    truncate_name,
    // Artist
    Artist,
    ArtistId,
    // Cluster
    Cluster,
    ClusterId,
    ClusterType,
    ClusterTypeId,
    DomainError,
    // Release
    Release,
    ReleaseId,
    // Track
    Track,
    TrackId,
    // User
    User,
    UserId,
    UserType,
    NONE_RELEASE_NAME,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Database
// ============================================================================

pub use db::{
    ConnectionPool, ConstraintRelaxation, Database, DatabaseStats, LockCoordinator,
    ReadTransaction, Session, Transaction, TransactionKind, WriteTransaction,
};

// ============================================================================
// PUBLIC API - Repositories
// ============================================================================

pub use repositories::{
    ArtistRepository, ClusterRepository, ReleaseRepository, SqliteArtistRepository,
    SqliteClusterRepository, SqliteReleaseRepository, SqliteTrackRepository,
    SqliteUserRepository, TrackRepository, UserRepository,
};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::AuthService;
