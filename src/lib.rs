//! Library crate for tebot-back: persistence of users, two-player sessions and their players.

/// Runtime configuration loaded at startup.
pub mod config;
/// Storage backends and typed record access.
pub mod dao;
/// Request and response bodies.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// axum handlers and router composition.
pub mod routes;
/// Operations over users, sessions and players.
pub mod services;
/// Shared application state.
pub mod state;
