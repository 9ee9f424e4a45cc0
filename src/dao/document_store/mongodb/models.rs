use mongodb::bson::{
    Document as BsonDocument, deserialize_from_document, doc, error::Error as BsonError,
    serialize_to_document,
};

use crate::dao::document_store::Document;

const ID_KEY: &str = "_id";

/// Filter matching the record stored under `id`.
pub fn doc_id(id: &str) -> BsonDocument {
    doc! { "_id": id }
}

/// Convert a record into a BSON document keyed by `_id`.
pub fn to_bson_document(id: &str, fields: &Document) -> Result<BsonDocument, BsonError> {
    let mut document = to_bson_fields(fields)?;
    document.insert(ID_KEY, id);
    Ok(document)
}

/// Convert a set of fields into BSON without adding an `_id`.
///
/// Integers that do not fit in an `i64` are refused rather than widened to a double.
pub fn to_bson_fields(fields: &Document) -> Result<BsonDocument, BsonError> {
    serialize_to_document(fields)
}

/// Convert a stored BSON document back into a record, dropping the Mongo `_id`.
///
/// BSON-only types come back in their relaxed extended JSON form (`{"$oid": ...}`).
pub fn from_bson_document(mut document: BsonDocument) -> Result<Document, BsonError> {
    document.remove(ID_KEY);
    deserialize_from_document(document)
}

#[cfg(test)]
mod tests {
    use mongodb::bson::oid::ObjectId;
    use serde_json::{Value, json};

    use super::*;

    fn object(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn record_round_trips_through_bson() {
        let fields = object(json!({
            "id": "s1",
            "movesCount": 4,
            "players": ["p1", "p2"],
            "nested": {"ratio": 0.5, "none": null},
        }));

        let bson = to_bson_document("s1", &fields).unwrap();
        assert_eq!(bson.get_str("_id").unwrap(), "s1");
        assert_eq!(from_bson_document(bson).unwrap(), fields);
    }

    #[test]
    fn int32_values_read_back_as_numbers() {
        let stored = doc! { "_id": "s1", "movesCount": 7_i32 };
        let record = from_bson_document(stored).unwrap();
        assert_eq!(record.get("movesCount"), Some(&json!(7)));
        assert!(!record.contains_key("_id"));
    }

    #[test]
    fn integers_beyond_i64_are_refused() {
        let fields = object(json!({"movesCount": u64::MAX}));
        assert!(to_bson_fields(&fields).is_err());
    }

    #[test]
    fn bson_only_values_are_not_flattened_to_strings() {
        let oid = ObjectId::new();
        let record = from_bson_document(doc! { "_id": "u1", "ref": oid }).unwrap();
        assert!(record["ref"].is_object());
    }
}
