//! Wire-level request and response shapes, with camelCase field names.

/// Shapes shared by every route.
pub mod common;
/// Health check response.
pub mod health;
/// Player views and update payloads.
pub mod player;
/// Session views and payloads.
pub mod session;
/// User views and payloads.
pub mod user;
