// src/domain/artist/mod.rs

pub mod entity;

pub use entity::Artist;
