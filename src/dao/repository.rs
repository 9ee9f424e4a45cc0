//! Entity access layer: single-record reads and writes over a [`DocumentStore`].
//!
//! Every stored record is decoded into its typed shape here, so malformed data
//! is reported at the storage boundary instead of leaking into the services.

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

use crate::dao::{
    document_store::{Collection, Document, DocumentStore},
    models::{
        PlayerDocument, PlayerEntity, PlayerPatch, SessionEntity, SessionPatch, UserEntity,
        UserPatch,
    },
    storage::StorageError,
};

/// Result alias for [`Repository`] operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Failures of the entity access layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// A stored record (or one of its encoded fields) does not match its schema.
    #[error("stored {collection} record `{id}` is malformed")]
    Deserialization {
        collection: Collection,
        id: String,
        #[source]
        source: serde_json::Error,
    },
    /// A record or patch could not be encoded for storage.
    #[error("failed to encode {collection} record `{id}`")]
    Serialization {
        collection: Collection,
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Typed access to the users, sessions and players collections.
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn DocumentStore>,
}

impl Repository {
    /// Repository over an injected store handle.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// User by id, `None` when absent.
    pub async fn get_user(&self, id: &str) -> RepositoryResult<Option<UserEntity>> {
        self.find(Collection::Users, id).await
    }

    /// Every stored user, in backend order.
    pub async fn list_users(&self) -> RepositoryResult<Vec<UserEntity>> {
        self.store
            .scan(Collection::Users)
            .await?
            .into_iter()
            .map(|document| {
                let id = document_id(&document);
                decode(Collection::Users, &id, document)
            })
            .collect()
    }

    /// Write a full user record, replacing any previous one.
    pub async fn create_user(&self, user: &UserEntity) -> RepositoryResult<()> {
        self.replace(Collection::Users, &user.id, user).await
    }

    /// Write only the fields set in `patch`.
    pub async fn merge_user(&self, id: &str, patch: &UserPatch) -> RepositoryResult<()> {
        self.merge(Collection::Users, id, patch).await
    }

    /// Delete a user; missing ids succeed.
    pub async fn delete_user(&self, id: &str) -> RepositoryResult<()> {
        Ok(self.store.delete(Collection::Users, id).await?)
    }

    /// Session as stored, with players as ids.
    pub async fn get_session_record(&self, id: &str) -> RepositoryResult<Option<SessionEntity>> {
        self.find(Collection::Sessions, id).await
    }

    /// Write a full session record.
    pub async fn create_session(&self, session: &SessionEntity) -> RepositoryResult<()> {
        self.replace(Collection::Sessions, &session.id, session).await
    }

    /// Write only the fields set in `patch`.
    pub async fn merge_session(&self, id: &str, patch: &SessionPatch) -> RepositoryResult<()> {
        self.merge(Collection::Sessions, id, patch).await
    }

    /// Delete a session; its players are untouched.
    pub async fn delete_session(&self, id: &str) -> RepositoryResult<()> {
        Ok(self.store.delete(Collection::Sessions, id).await?)
    }

    /// Player with both boards parsed from their stored string form.
    pub async fn get_player_record(&self, id: &str) -> RepositoryResult<Option<PlayerEntity>> {
        let document: Option<PlayerDocument> = self.find(Collection::Players, id).await?;
        Ok(document.map(PlayerEntity::from))
    }

    /// Write a full player record, boards encoded as strings.
    pub async fn create_player(&self, player: PlayerEntity) -> RepositoryResult<()> {
        let id = player.id.clone();
        self.replace(Collection::Players, &id, &PlayerDocument::from(player))
            .await
    }

    /// Write only the fields set in `patch`.
    pub async fn merge_player(&self, id: &str, patch: &PlayerPatch) -> RepositoryResult<()> {
        self.merge(Collection::Players, id, patch).await
    }

    /// Delete a player; missing ids succeed.
    pub async fn delete_player(&self, id: &str) -> RepositoryResult<()> {
        Ok(self.store.delete(Collection::Players, id).await?)
    }

    async fn find<T>(&self, collection: Collection, id: &str) -> RepositoryResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.store.get(collection, id).await? {
            Some(document) => decode(collection, id, document).map(Some),
            None => Ok(None),
        }
    }

    async fn replace<T>(&self, collection: Collection, id: &str, record: &T) -> RepositoryResult<()>
    where
        T: Serialize + ?Sized,
    {
        let document = encode(collection, id, record)?;
        Ok(self.store.replace(collection, id, document).await?)
    }

    async fn merge<T>(&self, collection: Collection, id: &str, patch: &T) -> RepositoryResult<()>
    where
        T: Serialize + ?Sized,
    {
        let fields = encode(collection, id, patch)?;
        Ok(self.store.merge(collection, id, fields).await?)
    }
}

fn decode<T>(collection: Collection, id: &str, document: Document) -> RepositoryResult<T>
where
    T: DeserializeOwned,
{
    serde_json::from_value(Value::Object(document)).map_err(|source| {
        RepositoryError::Deserialization {
            collection,
            id: id.to_owned(),
            source,
        }
    })
}

fn encode<T>(collection: Collection, id: &str, record: &T) -> RepositoryResult<Document>
where
    T: Serialize + ?Sized,
{
    let serialization_error = |source| RepositoryError::Serialization {
        collection,
        id: id.to_owned(),
        source,
    };

    match serde_json::to_value(record).map_err(serialization_error)? {
        Value::Object(document) => Ok(document),
        _ => Err(serialization_error(serde::ser::Error::custom(
            "record must serialize to an object",
        ))),
    }
}

fn document_id(document: &Document) -> String {
    document
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::dao::document_store::MemoryDocumentStore;

    fn repository() -> (MemoryDocumentStore, Repository) {
        let store = MemoryDocumentStore::new();
        (store.clone(), Repository::new(Arc::new(store)))
    }

    fn object(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[tokio::test]
    async fn missing_user_is_none() {
        let (_, repository) = repository();
        assert_eq!(repository.get_user("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn created_user_reads_back() {
        let (_, repository) = repository();
        repository
            .create_user(&UserEntity::new("u1", "A"))
            .await
            .unwrap();

        let user = repository.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user, UserEntity::new("u1", "A"));
    }

    #[tokio::test]
    async fn user_merge_keeps_untouched_fields() {
        let (_, repository) = repository();
        repository
            .create_user(&UserEntity::new("u1", "A"))
            .await
            .unwrap();

        repository
            .merge_user(
                "u1",
                &UserPatch {
                    active_session: Some(Some("s1".into())),
                    ..UserPatch::default()
                },
            )
            .await
            .unwrap();

        let user = repository.get_user("u1").await.unwrap().unwrap();
        assert_eq!(user.name, "A");
        assert!(user.sessions.is_empty());
        assert_eq!(user.active_session.as_deref(), Some("s1"));
    }

    #[tokio::test]
    async fn player_boards_round_trip_through_storage() {
        let (store, repository) = repository();
        let board = json!([["~", "x"], ["o", "~"]]);
        repository
            .create_player(PlayerEntity {
                id: "p1".into(),
                session: "s1".into(),
                user_id: "u1".into(),
                player_field: board.clone(),
                target_field: Value::Null,
                ready: false,
                extra: Document::new(),
            })
            .await
            .unwrap();

        let raw = store.get(Collection::Players, "p1").await.unwrap().unwrap();
        assert!(raw["playerField"].is_string());

        let player = repository.get_player_record("p1").await.unwrap().unwrap();
        assert_eq!(player.player_field, board);
    }

    #[tokio::test]
    async fn malformed_board_is_a_deserialization_error() {
        let (store, repository) = repository();
        store
            .replace(
                Collection::Players,
                "p1",
                object(json!({
                    "id": "p1",
                    "session": "s1",
                    "userId": "u1",
                    "playerField": "[[broken",
                })),
            )
            .await
            .unwrap();

        let err = repository.get_player_record("p1").await.unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Deserialization {
                collection: Collection::Players,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn storage_failure_is_propagated() {
        let (store, repository) = repository();
        store.set_offline(true);

        let err = repository.get_user("u1").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Storage(_)));
    }

    #[tokio::test]
    async fn list_users_decodes_every_record() {
        let (_, repository) = repository();
        for id in ["a", "b", "c"] {
            repository
                .create_user(&UserEntity::new(id, id.to_uppercase()))
                .await
                .unwrap();
        }

        let mut ids: Vec<_> = repository
            .list_users()
            .await
            .unwrap()
            .into_iter()
            .map(|user| user.id)
            .collect();
        ids.sort();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn session_with_wrong_player_count_is_malformed() {
        let (store, repository) = repository();
        store
            .replace(
                Collection::Sessions,
                "s1",
                object(json!({"id": "s1", "movesCount": 1, "players": ["only-one"]})),
            )
            .await
            .unwrap();

        let err = repository.get_session_record("s1").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Deserialization { .. }));
    }
}
