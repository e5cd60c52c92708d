// src/domain/track/mod.rs

pub mod entity;

pub use entity::Track;
