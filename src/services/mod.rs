// src/services/mod.rs
//
// Services Module - workflows that span a whole transaction

pub mod auth_service;

pub use auth_service::AuthService;
