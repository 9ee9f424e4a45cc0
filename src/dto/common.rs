use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Result of a lookup that may legitimately find nothing.
///
/// A missing record is answered with `200 {"data": null}`, never with an error status.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Lookup<T> {
    /// The record, serialized as is.
    Found(T),
    /// `{"data": null}`.
    Missing(NoData),
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(found) => Lookup::Found(found),
            None => Lookup::Missing(NoData::default()),
        }
    }
}

/// Marker body returned when a requested record does not exist.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct NoData {
    /// Always `null`.
    #[schema(value_type = Option<Object>)]
    pub data: Option<()>,
}

/// Acknowledgement for creation endpoints (`{"status": "ok"}`).
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedResponse {
    /// Always "ok".
    pub status: String,
}

impl CreatedResponse {
    /// The `{"status": "ok"}` acknowledgement.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Acknowledgement for deletion endpoints (`{"status": true}`).
#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedResponse {
    /// Always `true`.
    pub status: bool,
}

impl DeletedResponse {
    /// The `{"status": true}` acknowledgement.
    pub fn done() -> Self {
        Self { status: true }
    }
}

/// Request addressing a single record by id.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct IdRequest {
    /// Record id; a JSON number is accepted too.
    #[serde(deserialize_with = "record_id::deserialize")]
    #[validate(length(min = 1))]
    pub id: String,
}

/// Record ids are strings, but clients may send numeric account ids as JSON numbers.
pub mod record_id {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    /// Accept a JSON string or number and yield its string form.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_lookup_serializes_as_null_data() {
        let lookup: Lookup<String> = None.into();
        assert_eq!(serde_json::to_value(lookup).unwrap(), json!({"data": null}));
    }

    #[test]
    fn found_lookup_serializes_transparently() {
        let lookup: Lookup<_> = Some(json!({"id": "u1"})).into();
        assert_eq!(serde_json::to_value(lookup).unwrap(), json!({"id": "u1"}));
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let request: IdRequest = serde_json::from_value(json!({"id": 123456789})).unwrap();
        assert_eq!(request.id, "123456789");

        let request: IdRequest = serde_json::from_value(json!({"id": "abc"})).unwrap();
        assert_eq!(request.id, "abc");
    }

    #[test]
    fn empty_id_fails_validation() {
        let request: IdRequest = serde_json::from_value(json!({"id": ""})).unwrap();
        assert!(request.validate().is_err());
    }
}
