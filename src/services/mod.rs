/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Player lookups and single-field updates.
pub mod player_service;
/// Session creation, hydration and move counter updates.
pub mod session_service;
/// Storage connection supervision and degraded mode handling.
pub mod storage_supervisor;
/// User registration and session history bookkeeping.
pub mod user_service;
