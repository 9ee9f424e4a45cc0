/// Document store abstraction and its backends.
pub mod document_store;
/// Typed records persisted in the document store.
pub mod models;
/// Single-record access to users, sessions and players.
pub mod repository;
/// Storage error shared by every backend.
pub mod storage;
