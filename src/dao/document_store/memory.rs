//! Process-local [`DocumentStore`] used for development runs and the test suite.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use thiserror::Error;

use super::{Collection, Document, DocumentStore};
use crate::dao::storage::{StorageError, StorageResult};

/// Failure reported while the store is switched offline.
#[derive(Debug, Error)]
#[error("in-memory store is offline")]
pub struct OfflineError;

/// In-memory document store keeping one concurrent map per collection.
///
/// Cloning yields another handle onto the same data.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    users: DashMap<String, Document>,
    sessions: DashMap<String, Document>,
    players: DashMap<String, Document>,
    offline: AtomicBool,
    reads: [AtomicUsize; 3],
}

impl MemoryDocumentStore {
    /// Empty store, online.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unreachable backend: every operation fails while offline.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of single-record reads served for `collection` so far.
    pub fn read_count(&self, collection: Collection) -> usize {
        self.inner.reads[slot(collection)].load(Ordering::SeqCst)
    }

    fn records(&self, collection: Collection) -> &DashMap<String, Document> {
        match collection {
            Collection::Users => &self.inner.users,
            Collection::Sessions => &self.inner.sessions,
            Collection::Players => &self.inner.players,
        }
    }

    fn ensure_online(&self, operation: &str, collection: Collection) -> StorageResult<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable(
                format!("{operation} on `{collection}` failed"),
                OfflineError,
            ));
        }
        Ok(())
    }

    fn get_now(&self, collection: Collection, id: &str) -> StorageResult<Option<Document>> {
        self.ensure_online("get", collection)?;
        self.inner.reads[slot(collection)].fetch_add(1, Ordering::SeqCst);
        Ok(self.records(collection).get(id).map(|entry| entry.value().clone()))
    }

    fn scan_now(&self, collection: Collection) -> StorageResult<Vec<Document>> {
        self.ensure_online("scan", collection)?;
        Ok(self
            .records(collection)
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    fn replace_now(&self, collection: Collection, id: &str, document: Document) -> StorageResult<()> {
        self.ensure_online("replace", collection)?;
        self.records(collection).insert(id.to_owned(), document);
        Ok(())
    }

    fn merge_now(&self, collection: Collection, id: &str, fields: Document) -> StorageResult<()> {
        self.ensure_online("merge", collection)?;
        self.records(collection)
            .entry(id.to_owned())
            .or_default()
            .extend(fields);
        Ok(())
    }

    fn delete_now(&self, collection: Collection, id: &str) -> StorageResult<()> {
        self.ensure_online("delete", collection)?;
        self.records(collection).remove(id);
        Ok(())
    }
}

fn slot(collection: Collection) -> usize {
    match collection {
        Collection::Users => 0,
        Collection::Sessions => 1,
        Collection::Players => 2,
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<Document>>> {
        let result = self.get_now(collection, id);
        Box::pin(async move { result })
    }

    fn scan(&self, collection: Collection) -> BoxFuture<'static, StorageResult<Vec<Document>>> {
        let result = self.scan_now(collection);
        Box::pin(async move { result })
    }

    fn replace(
        &self,
        collection: Collection,
        id: &str,
        document: Document,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.replace_now(collection, id, document);
        Box::pin(async move { result })
    }

    fn merge(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.merge_now(collection, id, fields);
        Box::pin(async move { result })
    }

    fn delete(&self, collection: Collection, id: &str) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.delete_now(collection, id);
        Box::pin(async move { result })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let result = self.ensure_online("ping", Collection::Users);
        Box::pin(async move { result })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.health_check()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn document(value: serde_json::Value) -> Document {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[tokio::test]
    async fn merge_only_touches_named_fields() {
        let store = MemoryDocumentStore::new();
        store
            .replace(
                Collection::Users,
                "u1",
                document(json!({"id": "u1", "name": "A", "sessions": []})),
            )
            .await
            .unwrap();

        store
            .merge(Collection::Users, "u1", document(json!({"name": "B"})))
            .await
            .unwrap();

        let stored = store.get(Collection::Users, "u1").await.unwrap().unwrap();
        assert_eq!(
            serde_json::Value::Object(stored),
            json!({"id": "u1", "name": "B", "sessions": []})
        );
    }

    #[tokio::test]
    async fn merge_creates_missing_record() {
        let store = MemoryDocumentStore::new();
        store
            .merge(Collection::Sessions, "s1", document(json!({"movesCount": 3})))
            .await
            .unwrap();

        let stored = store.get(Collection::Sessions, "s1").await.unwrap();
        assert_eq!(stored, Some(document(json!({"movesCount": 3}))));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryDocumentStore::new();
        store
            .replace(Collection::Players, "p1", document(json!({"id": "p1"})))
            .await
            .unwrap();

        store.delete(Collection::Players, "p1").await.unwrap();
        store.delete(Collection::Players, "p1").await.unwrap();
        assert!(store.get(Collection::Players, "p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn collections_are_independent() {
        let store = MemoryDocumentStore::new();
        store
            .replace(Collection::Users, "x", document(json!({"id": "x"})))
            .await
            .unwrap();

        assert!(store.get(Collection::Sessions, "x").await.unwrap().is_none());
        assert_eq!(store.scan(Collection::Users).await.unwrap().len(), 1);
        assert!(store.scan(Collection::Players).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn offline_store_fails_every_operation() {
        let store = MemoryDocumentStore::new();
        store.set_offline(true);

        assert!(store.get(Collection::Users, "u1").await.is_err());
        assert!(store.scan(Collection::Users).await.is_err());
        assert!(store.delete(Collection::Users, "u1").await.is_err());
        assert!(store.health_check().await.is_err());

        store.set_offline(false);
        assert!(store.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn read_count_tracks_single_record_reads() {
        let store = MemoryDocumentStore::new();
        store.get(Collection::Sessions, "a").await.unwrap();
        store.get(Collection::Sessions, "b").await.unwrap();
        store.get(Collection::Users, "c").await.unwrap();

        assert_eq!(store.read_count(Collection::Sessions), 2);
        assert_eq!(store.read_count(Collection::Users), 1);
        assert_eq!(store.read_count(Collection::Players), 0);
    }
}
