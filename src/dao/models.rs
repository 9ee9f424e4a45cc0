use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{json::JsonString, serde_as};

use crate::dao::document_store::Document;

/// Keys owned by the player record itself; caller-supplied extras never shadow them.
pub const RESERVED_PLAYER_KEYS: [&str; 6] =
    ["id", "session", "userId", "playerField", "targetField", "ready"];

/// Persistent account, independent of any particular session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    /// Caller-supplied identity (e.g. a chat account id).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Every session the user has taken part in, oldest first.
    #[serde(default)]
    pub sessions: Vec<String>,
    /// Session the user is currently playing, if any.
    #[serde(default)]
    pub active_session: Option<String>,
}

impl UserEntity {
    /// A fresh account with no session history.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sessions: Vec::new(),
            active_session: None,
        }
    }
}

/// A match between exactly two players, holding player ids rather than players.
///
/// The fixed-size `players` array makes a stored session with any other number
/// of player references fail to decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntity {
    /// Generated UUID.
    pub id: String,
    /// Starts at 1.
    pub moves_count: u32,
    /// Player 1 then player 2.
    pub players: [String; 2],
}

/// Participant record scoped to one session, with its boards in structured form.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerEntity {
    /// Generated UUID.
    pub id: String,
    /// Owning session (back-reference).
    pub session: String,
    /// User this player represents.
    pub user_id: String,
    /// The player's own board.
    pub player_field: Value,
    /// The player's view of the opponent board.
    pub target_field: Value,
    /// Set by the client once the board is placed.
    pub ready: bool,
    /// Additional attributes supplied when the player was created.
    pub extra: Document,
}

/// Stored shape of a player: both boards are kept as JSON-encoded strings.
#[serde_as]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlayerDocument {
    id: String,
    session: String,
    user_id: String,
    #[serde_as(as = "JsonString")]
    #[serde(default)]
    player_field: Value,
    #[serde_as(as = "JsonString")]
    #[serde(default)]
    target_field: Value,
    #[serde(default)]
    ready: bool,
    #[serde(flatten)]
    extra: Document,
}

impl From<PlayerEntity> for PlayerDocument {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id,
            session: value.session,
            user_id: value.user_id,
            player_field: value.player_field,
            target_field: value.target_field,
            ready: value.ready,
            extra: without_reserved_keys(value.extra),
        }
    }
}

impl From<PlayerDocument> for PlayerEntity {
    fn from(value: PlayerDocument) -> Self {
        Self {
            id: value.id,
            session: value.session,
            user_id: value.user_id,
            player_field: value.player_field,
            target_field: value.target_field,
            ready: value.ready,
            extra: value.extra,
        }
    }
}

/// Player definition supplied when a session is created; ids are assigned by the backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPlayer {
    /// User this player represents.
    pub user_id: String,
    /// Initial own board.
    pub player_field: Value,
    /// Initial opponent board view.
    pub target_field: Value,
    /// Initial ready flag.
    pub ready: bool,
    /// Caller attributes kept alongside the record.
    pub extra: Document,
}

impl NewPlayer {
    /// Bind the definition to its generated id and owning session.
    pub fn into_entity(self, id: String, session: &str) -> PlayerEntity {
        PlayerEntity {
            id,
            session: session.to_owned(),
            user_id: self.user_id,
            player_field: self.player_field,
            target_field: self.target_field,
            ready: self.ready,
            extra: without_reserved_keys(self.extra),
        }
    }
}

/// Session with both players hydrated, in the order recorded on the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionWithPlayers {
    /// Session id.
    pub id: String,
    /// Current move counter.
    pub moves_count: u32,
    /// Player 1 then player 2.
    pub players: [PlayerEntity; 2],
}

/// Player together with the full parent session record.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerWithSession {
    /// The requested player.
    pub player: PlayerEntity,
    /// Its parent session record.
    pub session: SessionEntity,
}

/// Partial user write: only `Some` fields reach the store.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    /// New display name.
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Replacement session history.
    pub sessions: Option<Vec<String>>,
    /// `Some(None)` clears the active session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_session: Option<Option<String>>,
}

/// Partial session write.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    /// New move counter.
    pub moves_count: Option<u32>,
}

/// Partial player write; boards are encoded to their stored string form.
#[serde_as]
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPatch {
    #[serde_as(as = "Option<JsonString>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    /// New own board.
    pub player_field: Option<Value>,
    #[serde_as(as = "Option<JsonString>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    /// New opponent board view.
    pub target_field: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// New ready flag.
    pub ready: Option<bool>,
}

fn without_reserved_keys(mut extra: Document) -> Document {
    extra.retain(|key, _| !RESERVED_PLAYER_KEYS.contains(&key.as_str()) && !key.starts_with('_'));
    extra
}
