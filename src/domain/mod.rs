// src/domain/mod.rs
//
// Domain Root - catalog entities and their invariants
//
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod artist;
pub mod cluster;
pub mod ids;
pub mod names;
pub mod release;
pub mod track;
pub mod user;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use artist::Artist;
pub use cluster::{Cluster, ClusterType};
pub use ids::{ArtistId, ClusterId, ClusterTypeId, ReleaseId, TrackId, UserId};
pub use names::truncate_name;
pub use release::{validate_total_disc, validate_year, Release, NONE_RELEASE_NAME};
pub use track::Track;
pub use user::{validate_login_name, User, UserType};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of entity invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
