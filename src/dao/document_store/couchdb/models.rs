use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dao::document_store::{Collection, Document};

const SEPARATOR: &str = "::";
/// Upper bound appended to a prefix for `_all_docs` range scans.
pub const END_SUFFIX: &str = "\u{ffff}";

/// Response body of `GET /{db}/_all_docs?include_docs=true`.
#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    /// Matched rows.
    pub rows: Vec<AllDocsRow>,
}

/// One `_all_docs` row.
#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    /// Included document, absent for deleted rows.
    #[serde(default)]
    pub doc: Option<Value>,
}

/// A CouchDB document: the record fields next to CouchDB's own `_id`/`_rev`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchRecord {
    /// Namespaced document id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Current revision, `None` for new documents.
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// Record fields.
    #[serde(flatten)]
    pub fields: Document,
}

impl CouchRecord {
    /// Document for `id` in `collection`, reserved keys stripped.
    pub fn new(collection: Collection, id: &str, rev: Option<String>, fields: Document) -> Self {
        Self {
            id: record_doc_id(collection, id),
            rev,
            fields: strip_reserved(fields),
        }
    }
}

/// All collections share one CouchDB database, so ids are namespaced by collection.
pub fn record_doc_id(collection: Collection, id: &str) -> String {
    format!("{}{SEPARATOR}{id}", collection.name())
}

/// Id prefix shared by every document of `collection`.
pub fn collection_prefix(collection: Collection) -> String {
    format!("{}{SEPARATOR}", collection.name())
}

/// CouchDB owns every top-level key starting with an underscore.
fn strip_reserved(mut fields: Document) -> Document {
    fields.retain(|key, _| !key.starts_with('_'));
    fields
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn doc_ids_are_namespaced_per_collection() {
        assert_eq!(record_doc_id(Collection::Users, "42"), "users::42");
        assert_eq!(record_doc_id(Collection::Players, "p"), "players::p");
        assert!(record_doc_id(Collection::Sessions, "s").starts_with(&collection_prefix(Collection::Sessions)));
    }

    #[test]
    fn record_serializes_fields_next_to_couch_metadata() {
        let Value::Object(fields) = json!({"name": "A", "_deleted": true}) else {
            unreachable!()
        };
        let record = CouchRecord::new(Collection::Users, "u1", Some("1-abc".into()), fields);

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"_id": "users::u1", "_rev": "1-abc", "name": "A"})
        );
    }

    #[test]
    fn record_reads_back_without_metadata_in_fields() {
        let record: CouchRecord =
            serde_json::from_value(json!({"_id": "users::u1", "_rev": "2-x", "name": "A"})).unwrap();

        assert_eq!(record.rev.as_deref(), Some("2-x"));
        assert_eq!(record.fields.get("name"), Some(&json!("A")));
        assert!(!record.fields.contains_key("_id"));
    }
}
