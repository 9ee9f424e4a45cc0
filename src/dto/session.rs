use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::{
        document_store::Document,
        models::{NewPlayer, SessionEntity, SessionWithPlayers},
    },
    dto::{common::record_id, player::PlayerView},
};

/// One player definition inside a `dbAddSession` body.
///
/// Fields other than the known ones are stored with the player and returned on read.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewPlayerInput {
    /// User this player represents.
    #[serde(deserialize_with = "record_id::deserialize")]
    #[validate(length(min = 1))]
    pub user_id: String,
    /// The player's own board.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub player_field: Value,
    /// The player's view of the opponent board.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub target_field: Value,
    /// Whether the board is placed.
    #[serde(default)]
    pub ready: bool,
    /// Caller attributes stored with the player.
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Document,
}

impl From<NewPlayerInput> for NewPlayer {
    fn from(input: NewPlayerInput) -> Self {
        Self {
            user_id: input.user_id,
            player_field: input.player_field,
            target_field: input.target_field,
            ready: input.ready,
            extra: input.extra,
        }
    }
}

/// Body of `dbAddSession`: a bare JSON array holding both player definitions.
#[derive(Debug, Deserialize, Validate)]
#[serde(transparent)]
pub struct AddSessionRequest {
    /// Player definitions, exactly two.
    #[validate(nested)]
    pub players: Vec<NewPlayerInput>,
}

/// Payload setting the move counter of a session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMovesCountRequest {
    /// Record id.
    #[serde(deserialize_with = "record_id::deserialize")]
    #[validate(length(min = 1))]
    pub id: String,
    /// Move counter, at least 1.
    #[validate(range(min = 1))]
    pub moves_count: u32,
}

/// Session with both players hydrated.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// Record id.
    pub id: String,
    /// Move counter, at least 1.
    pub moves_count: u32,
    /// Player 1 then player 2.
    pub players: Vec<PlayerView>,
}

impl From<SessionWithPlayers> for SessionView {
    fn from(session: SessionWithPlayers) -> Self {
        Self {
            id: session.id,
            moves_count: session.moves_count,
            players: session.players.into_iter().map(PlayerView::from).collect(),
        }
    }
}

/// Session as stored, with player ids only.
#[derive(Debug, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Record id.
    pub id: String,
    /// Move counter, at least 1.
    pub moves_count: u32,
    /// Player ids, player 1 first.
    pub players: Vec<String>,
}

impl From<SessionEntity> for SessionSummary {
    fn from(session: SessionEntity) -> Self {
        Self {
            id: session.id,
            moves_count: session.moves_count,
            players: session.players.into(),
        }
    }
}
