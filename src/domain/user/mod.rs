// src/domain/user/mod.rs

pub mod entity;
pub mod invariants;

pub use entity::{User, UserType};
pub use invariants::validate_login_name;
