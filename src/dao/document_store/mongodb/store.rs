use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection as MongoCollection, Database,
    bson::{Document as BsonDocument, doc},
};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{doc_id, from_bson_document, to_bson_document, to_bson_fields},
};
use crate::dao::{
    document_store::{Collection, Document, DocumentStore},
    storage::StorageResult,
};

/// MongoDB-backed [`DocumentStore`]; each [`Collection`] maps to a Mongo collection of the same name.
#[derive(Clone)]
pub struct MongoDocumentStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    // Held so the connection pool lives as long as the database handle.
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoDocumentStore {
    /// Establish a connection to MongoDB.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        Ok(Self { inner })
    }

    async fn collection(&self, collection: Collection) -> MongoCollection<BsonDocument> {
        let guard = self.inner.state.read().await;
        guard.database.collection::<BsonDocument>(collection.name())
    }

    async fn find_document(&self, collection: Collection, id: String) -> MongoResult<Option<Document>> {
        let document = self
            .collection(collection)
            .await
            .find_one(doc_id(&id))
            .await
            .map_err(|source| MongoDaoError::Load {
                collection,
                id,
                source,
            })?;

        document
            .map(|document| decode(collection, document))
            .transpose()
    }

    async fn scan_documents(&self, collection: Collection) -> MongoResult<Vec<Document>> {
        let documents: Vec<BsonDocument> = self
            .collection(collection)
            .await
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::Scan { collection, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Scan { collection, source })?;

        documents
            .into_iter()
            .map(|document| decode(collection, document))
            .collect()
    }

    async fn replace_document(&self, collection: Collection, id: String, document: Document) -> MongoResult<()> {
        let replacement = to_bson_document(&id, &document).map_err(|source| {
            MongoDaoError::Encode {
                collection,
                id: id.clone(),
                source,
            }
        })?;
        self.collection(collection)
            .await
            .replace_one(doc_id(&id), &replacement)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection,
                id,
                source,
            })?;

        Ok(())
    }

    async fn merge_document(&self, collection: Collection, id: String, fields: Document) -> MongoResult<()> {
        // `$set` with an empty document is rejected by the server.
        if fields.is_empty() {
            return Ok(());
        }

        let fields = to_bson_fields(&fields).map_err(|source| MongoDaoError::Encode {
            collection,
            id: id.clone(),
            source,
        })?;
        let update = doc! { "$set": fields };
        self.collection(collection)
            .await
            .update_one(doc_id(&id), update)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection,
                id,
                source,
            })?;

        Ok(())
    }

    async fn delete_document(&self, collection: Collection, id: String) -> MongoResult<()> {
        self.collection(collection)
            .await
            .delete_one(doc_id(&id))
            .await
            .map_err(|source| MongoDaoError::Delete {
                collection,
                id,
                source,
            })?;

        Ok(())
    }
}

fn decode(collection: Collection, document: BsonDocument) -> MongoResult<Document> {
    from_bson_document(document).map_err(|source| MongoDaoError::Decode { collection, source })
}

impl DocumentStore for MongoDocumentStore {
    fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<Document>>> {
        let store = self.clone();
        let id = id.to_owned();
        Box::pin(async move { store.find_document(collection, id).await.map_err(Into::into) })
    }

    fn scan(&self, collection: Collection) -> BoxFuture<'static, StorageResult<Vec<Document>>> {
        let store = self.clone();
        Box::pin(async move { store.scan_documents(collection).await.map_err(Into::into) })
    }

    fn replace(
        &self,
        collection: Collection,
        id: &str,
        document: Document,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let id = id.to_owned();
        Box::pin(async move {
            store
                .replace_document(collection, id, document)
                .await
                .map_err(Into::into)
        })
    }

    fn merge(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let id = id.to_owned();
        Box::pin(async move { store.merge_document(collection, id, fields).await.map_err(Into::into) })
    }

    fn delete(&self, collection: Collection, id: &str) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let id = id.to_owned();
        Box::pin(async move { store.delete_document(collection, id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
