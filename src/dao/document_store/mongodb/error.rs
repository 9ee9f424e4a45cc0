use mongodb::{bson::error::Error as BsonError, error::Error as MongoError};
use thiserror::Error;

use crate::dao::document_store::Collection;

/// Result alias for the Mongo backend.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures of the Mongo backend, tagged with the collection and id involved.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to load {collection} document `{id}`")]
    Load {
        collection: Collection,
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to scan {collection} collection")]
    Scan {
        collection: Collection,
        #[source]
        source: MongoError,
    },
    #[error("failed to write {collection} document `{id}`")]
    Write {
        collection: Collection,
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to encode {collection} document `{id}` as BSON")]
    Encode {
        collection: Collection,
        id: String,
        #[source]
        source: BsonError,
    },
    #[error("failed to decode stored {collection} document")]
    Decode {
        collection: Collection,
        #[source]
        source: BsonError,
    },
    #[error("failed to delete {collection} document `{id}`")]
    Delete {
        collection: Collection,
        id: String,
        #[source]
        source: MongoError,
    },
}
