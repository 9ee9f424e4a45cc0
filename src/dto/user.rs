use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{dao::models::UserEntity, dto::common::record_id};

/// Payload registering a new user under a caller-chosen id.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddUserRequest {
    #[serde(deserialize_with = "record_id::deserialize")]
    /// Caller-chosen user id.
    #[validate(length(min = 1))]
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Payload naming a user and one of their sessions.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserSessionRequest {
    #[serde(deserialize_with = "record_id::deserialize")]
    /// User id.
    #[validate(length(min = 1))]
    pub id: String,
    /// Session id.
    #[validate(length(min = 1))]
    pub session_id: String,
}

/// User as returned to clients.
#[derive(Debug, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    /// User id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Every session the user joined, oldest first.
    pub sessions: Vec<String>,
    /// Session currently being played, if any.
    pub active_session: Option<String>,
}

impl From<UserEntity> for UserView {
    fn from(user: UserEntity) -> Self {
        Self {
            id: user.id,
            name: user.name,
            sessions: user.sessions,
            active_session: user.active_session,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn fresh_user_view_has_null_active_session() {
        let view = UserView::from(UserEntity::new("u1", "A"));
        assert_eq!(
            serde_json::to_value(view).unwrap(),
            json!({"id": "u1", "name": "A", "sessions": [], "activeSession": null})
        );
    }

    #[test]
    fn session_request_uses_camel_case() {
        let request: UserSessionRequest =
            serde_json::from_value(json!({"id": 42, "sessionId": "s1"})).unwrap();
        assert_eq!(request.id, "42");
        assert_eq!(request.session_id, "s1");
    }
}
