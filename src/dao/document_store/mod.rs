#[cfg(feature = "couch-store")]
/// CouchDB backend.
pub mod couchdb;
/// In-process backend.
pub mod memory;
#[cfg(feature = "mongo-store")]
/// MongoDB backend.
pub mod mongodb;

use std::fmt;

use futures::future::BoxFuture;
use serde_json::{Map, Value};

use crate::dao::storage::StorageResult;

pub use memory::MemoryDocumentStore;

/// Raw record as held by a backend: a flat JSON object of named fields.
pub type Document = Map<String, Value>;

/// The three independent collections the backend persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// User accounts.
    Users,
    /// Two-player sessions.
    Sessions,
    /// Per-session players.
    Players,
}

impl Collection {
    /// Every collection, in a stable order.
    pub const ALL: [Collection; 3] = [Collection::Users, Collection::Sessions, Collection::Players];

    /// Name of the collection in the backing database.
    pub const fn name(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Sessions => "sessions",
            Collection::Players => "players",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Abstraction over the document database holding users, sessions and players.
///
/// Records are addressed by opaque string ids. No operation spans more than one
/// record, and no multi-record transaction is offered.
pub trait DocumentStore: Send + Sync {
    /// Fetch a single record, `None` when it does not exist.
    fn get(&self, collection: Collection, id: &str)
    -> BoxFuture<'static, StorageResult<Option<Document>>>;
    /// Return every record of a collection.
    fn scan(&self, collection: Collection) -> BoxFuture<'static, StorageResult<Vec<Document>>>;
    /// Write a record, replacing whatever was stored under `id`.
    fn replace(
        &self,
        collection: Collection,
        id: &str,
        document: Document,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Upsert only the named fields, leaving the other stored fields untouched.
    fn merge(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Delete a record. Deleting a missing record succeeds.
    fn delete(&self, collection: Collection, id: &str) -> BoxFuture<'static, StorageResult<()>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
