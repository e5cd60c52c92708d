// src/domain/release/mod.rs

pub mod entity;
pub mod invariants;

pub use entity::{Release, NONE_RELEASE_NAME};
pub use invariants::{validate_total_disc, validate_year};
