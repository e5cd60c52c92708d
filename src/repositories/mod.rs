// src/repositories/mod.rs
//
// Repository layer
//
// RULES:
// - Repositories are data mappers over a caller-supplied transaction
// - Reads accept any transaction, mutations require a WriteTransaction
// - No connection or lock handling here
// - Explicit SQL only

pub mod artist_repository;
pub mod cluster_repository;
pub mod release_repository;
pub mod track_repository;
pub mod user_repository;

pub use artist_repository::{ArtistRepository, SqliteArtistRepository};
pub use cluster_repository::{ClusterRepository, SqliteClusterRepository};
pub use release_repository::{ReleaseRepository, SqliteReleaseRepository};
pub use track_repository::{SqliteTrackRepository, TrackRepository};
pub use user_repository::{SqliteUserRepository, UserRepository};
