use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde_json::from_value;

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{AllDocsResponse, CouchRecord, END_SUFFIX, collection_prefix, record_doc_id},
};
use crate::dao::{
    document_store::{Collection, Document, DocumentStore},
    storage::StorageResult,
};

/// CouchDB-backed [`DocumentStore`] keeping all collections in a single database.
///
/// Merges are read-modify-write on the document revision; a concurrent writer
/// surfaces as [`CouchDaoError::Conflict`] instead of being silently overwritten.
#[derive(Clone)]
pub struct CouchDocumentStore {
    client: Client,
    database_url: Arc<Url>,
    database: Arc<str>,
    auth: Option<Arc<(String, String)>>,
}

impl CouchDocumentStore {
    /// Build the HTTP client and make sure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let invalid_url = || CouchDaoError::InvalidUrl {
            url: config.base_url.clone(),
        };
        let mut database_url =
            Url::parse(config.base_url.trim_end_matches('/')).map_err(|_| invalid_url())?;
        database_url
            .path_segments_mut()
            .map_err(|_| invalid_url())?
            .push(&config.database);

        let store = Self {
            client,
            database_url: Arc::new(database_url),
            database: Arc::from(config.database),
            auth: config.credentials.map(Arc::new),
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.auth.as_deref() {
            Some((user, pass)) => builder.basic_auth(user, Some(pass)),
            None => builder,
        }
    }

    fn document_url(&self, doc_id: &str) -> Url {
        let mut url = (*self.database_url).clone();
        // The database url was validated as a base url in `connect`.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(doc_id);
        }
        url
    }

    fn request(&self, method: Method, doc_id: &str) -> RequestBuilder {
        self.with_auth(self.client.request(method, self.document_url(doc_id)))
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = (*self.database_url).clone();

        let response = self
            .with_auth(self.client.get(url.clone()))
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .with_auth(self.client.put(url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::RequestSend {
                        path: database.clone(),
                        source,
                    })?;
                // 412 means a concurrent caller created it first.
                if create.status().is_success() || create.status() == StatusCode::PRECONDITION_FAILED {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn fetch(&self, collection: Collection, id: &str) -> CouchResult<Option<CouchRecord>> {
        let doc_id = record_doc_id(collection, id);
        let response = self
            .request(Method::GET, &doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<CouchRecord>()
                .await
                .map(Some)
                .map_err(|source| CouchDaoError::DecodeResponse {
                    path: doc_id,
                    source,
                }),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id,
                status: other,
            }),
        }
    }

    async fn store(&self, collection: Collection, id: &str, record: &CouchRecord) -> CouchResult<()> {
        let response = self
            .request(Method::PUT, &record.id)
            .json(record)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: record.id.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::CONFLICT => Err(CouchDaoError::Conflict {
                collection,
                id: id.to_owned(),
            }),
            status if status.is_success() => Ok(()),
            other => Err(CouchDaoError::RequestStatus {
                path: record.id.clone(),
                status: other,
            }),
        }
    }

    async fn find_document(&self, collection: Collection, id: String) -> CouchResult<Option<Document>> {
        Ok(self.fetch(collection, &id).await?.map(|record| record.fields))
    }

    async fn scan_documents(&self, collection: Collection) -> CouchResult<Vec<Document>> {
        const ALL_DOCS: &str = "_all_docs";
        let prefix = collection_prefix(collection);
        let query = [
            ("include_docs", "true".to_owned()),
            ("startkey", format!("\"{prefix}\"")),
            ("endkey", format!("\"{prefix}{END_SUFFIX}\"")),
        ];

        let response = self
            .request(Method::GET, ALL_DOCS)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: ALL_DOCS.to_owned(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: ALL_DOCS.to_owned(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: ALL_DOCS.to_owned(),
                source,
            }
        })?;

        payload
            .rows
            .into_iter()
            .filter_map(|row| row.doc)
            .map(|doc| {
                from_value::<CouchRecord>(doc)
                    .map(|record| record.fields)
                    .map_err(|source| CouchDaoError::DecodeDocument {
                        path: ALL_DOCS.to_owned(),
                        source,
                    })
            })
            .collect()
    }

    async fn replace_document(
        &self,
        collection: Collection,
        id: String,
        document: Document,
    ) -> CouchResult<()> {
        let rev = self.fetch(collection, &id).await?.and_then(|existing| existing.rev);
        let record = CouchRecord::new(collection, &id, rev, document);
        self.store(collection, &id, &record).await
    }

    async fn merge_document(&self, collection: Collection, id: String, fields: Document) -> CouchResult<()> {
        let (rev, mut merged) = match self.fetch(collection, &id).await? {
            Some(existing) => (existing.rev, existing.fields),
            None => (None, Document::new()),
        };
        merged.extend(fields);
        let record = CouchRecord::new(collection, &id, rev, merged);
        self.store(collection, &id, &record).await
    }

    async fn delete_document(&self, collection: Collection, id: String) -> CouchResult<()> {
        let Some(existing) = self.fetch(collection, &id).await? else {
            return Ok(());
        };
        let Some(rev) = existing.rev else {
            return Ok(());
        };

        let response = self
            .request(Method::DELETE, &existing.id)
            .query(&[("rev", rev)])
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: existing.id.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(()),
            StatusCode::CONFLICT => Err(CouchDaoError::Conflict { collection, id }),
            status if status.is_success() => Ok(()),
            other => Err(CouchDaoError::RequestStatus {
                path: existing.id,
                status: other,
            }),
        }
    }
}

impl DocumentStore for CouchDocumentStore {
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
        Box::pin(async move {
            store
                .merge_document(collection, id, fields)
                .await
                .map_err(Into::into)
        })
    }

    fn delete(&self, collection: Collection, id: &str) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let id = id.to_owned();
        Box::pin(async move { store.delete_document(collection, id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = (*store.database_url).clone();
            let response = store
                .with_auth(store.client.get(url))
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: store.database.to_string(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::DatabaseStatus {
                    database: store.database.to_string(),
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
