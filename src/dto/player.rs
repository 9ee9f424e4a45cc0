use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::{
        document_store::Document,
        models::{PlayerEntity, PlayerWithSession},
    },
    dto::{common::record_id, session::SessionSummary},
};

/// Player with both boards in structured form.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    /// Record id.
    pub id: String,
    /// Owning session id.
    pub session: String,
    /// User this player represents.
    pub user_id: String,
    /// The player's own board.
    #[schema(value_type = Object)]
    pub player_field: Value,
    /// The player's view of the opponent board.
    #[schema(value_type = Object)]
    pub target_field: Value,
    /// Whether the board is placed.
    pub ready: bool,
    /// Caller attributes stored with the player.
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Document,
}

impl From<PlayerEntity> for PlayerView {
    fn from(player: PlayerEntity) -> Self {
        Self {
            id: player.id,
            session: player.session,
            user_id: player.user_id,
            player_field: player.player_field,
            target_field: player.target_field,
            ready: player.ready,
            extra: player.extra,
        }
    }
}

/// Player whose `session` reference is replaced by the full parent session.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDetailsView {
    /// Record id.
    pub id: String,
    /// Parent session.
    pub session: SessionSummary,
    /// User this player represents.
    pub user_id: String,
    /// The player's own board.
    #[schema(value_type = Object)]
    pub player_field: Value,
    /// The player's view of the opponent board.
    #[schema(value_type = Object)]
    pub target_field: Value,
    /// Whether the board is placed.
    pub ready: bool,
    /// Caller attributes stored with the player.
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Document,
}

impl From<PlayerWithSession> for PlayerDetailsView {
    fn from(value: PlayerWithSession) -> Self {
        let PlayerWithSession { player, session } = value;
        Self {
            id: player.id,
            session: session.into(),
            user_id: player.user_id,
            player_field: player.player_field,
            target_field: player.target_field,
            ready: player.ready,
            extra: player.extra,
        }
    }
}

/// Payload replacing a player's own board.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlayerFieldRequest {
    /// Record id.
    #[serde(deserialize_with = "record_id::deserialize")]
    #[validate(length(min = 1))]
    pub id: String,
    /// The player's own board.
    #[schema(value_type = Object)]
    pub player_field: Value,
}

/// Payload replacing a player's view of the opponent board.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTargetFieldRequest {
    /// Record id.
    #[serde(deserialize_with = "record_id::deserialize")]
    #[validate(length(min = 1))]
    pub id: String,
    /// The player's view of the opponent board.
    #[schema(value_type = Object)]
    pub target_field: Value,
}

/// Payload toggling a player's ready flag.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateReadyRequest {
    /// Record id.
    #[serde(deserialize_with = "record_id::deserialize")]
    #[validate(length(min = 1))]
    pub id: String,
    /// Whether the board is placed.
    pub ready: bool,
}
