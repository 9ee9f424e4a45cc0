use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::{
        common::{DeletedResponse, IdRequest, Lookup},
        player::{
            PlayerDetailsView, UpdatePlayerFieldRequest, UpdateReadyRequest,
            UpdateTargetFieldRequest,
        },
    },
    error::AppError,
    services::player_service,
    state::SharedState,
};

/// Player endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/dbGetPlayer", post(get_player))
        .route("/dbGetPlayerByUserId", post(get_player_by_user_id))
        .route("/dbUpdatePlayerField", post(update_player_field))
        .route("/dbUpdatePlayerTargetField", post(update_player_target_field))
        .route("/dbUpdatePlayerReady", post(update_player_ready))
        .route("/dbDeletePlayer", post(delete_player))
}

/// Fetch a player with its parent session inlined.
#[utoipa::path(
    post,
    path = "/dbGetPlayer",
    tag = "players",
    request_body = IdRequest,
    responses(
        (status = 200, description = "Player with its session, or `{\"data\": null}` when unknown", body = PlayerDetailsView),
        (status = 409, description = "Player references a missing session")
    )
)]
pub async fn get_player(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<IdRequest>>,
) -> Result<Json<Lookup<PlayerDetailsView>>, AppError> {
    let player = player_service::get_player(&state, &request.id).await?;
    Ok(Json(player.map(PlayerDetailsView::from).into()))
}

/// Fetch the player a user controls in their active session; `id` is the user id.
#[utoipa::path(
    post,
    path = "/dbGetPlayerByUserId",
    tag = "players",
    request_body = IdRequest,
    responses((status = 200, description = "Player with its session, or `{\"data\": null}` at the first missing link", body = PlayerDetailsView))
)]
pub async fn get_player_by_user_id(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<IdRequest>>,
) -> Result<Json<Lookup<PlayerDetailsView>>, AppError> {
    let player = player_service::get_player_by_user_id(&state, &request.id).await?;
    Ok(Json(player.map(PlayerDetailsView::from).into()))
}

/// Replace the player's own board.
#[utoipa::path(
    post,
    path = "/dbUpdatePlayerField",
    tag = "players",
    request_body = UpdatePlayerFieldRequest,
    responses((status = 200, description = "Updated player, or `{\"data\": null}` when unknown", body = PlayerDetailsView))
)]
pub async fn update_player_field(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<UpdatePlayerFieldRequest>>,
) -> Result<Json<Lookup<PlayerDetailsView>>, AppError> {
    let player =
        player_service::update_player_field(&state, &request.id, request.player_field).await?;
    Ok(Json(player.map(PlayerDetailsView::from).into()))
}

/// Replace the player's view of the opponent board.
#[utoipa::path(
    post,
    path = "/dbUpdatePlayerTargetField",
    tag = "players",
    request_body = UpdateTargetFieldRequest,
    responses((status = 200, description = "Updated player, or `{\"data\": null}` when unknown", body = PlayerDetailsView))
)]
pub async fn update_player_target_field(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<UpdateTargetFieldRequest>>,
) -> Result<Json<Lookup<PlayerDetailsView>>, AppError> {
    let player =
        player_service::update_player_target_field(&state, &request.id, request.target_field)
            .await?;
    Ok(Json(player.map(PlayerDetailsView::from).into()))
}

/// Set the player's ready flag.
#[utoipa::path(
    post,
    path = "/dbUpdatePlayerReady",
    tag = "players",
    request_body = UpdateReadyRequest,
    responses((status = 200, description = "Updated player, or `{\"data\": null}` when unknown", body = PlayerDetailsView))
)]
pub async fn update_player_ready(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<UpdateReadyRequest>>,
) -> Result<Json<Lookup<PlayerDetailsView>>, AppError> {
    let player = player_service::update_player_ready(&state, &request.id, request.ready).await?;
    Ok(Json(player.map(PlayerDetailsView::from).into()))
}

/// Delete a player record.
#[utoipa::path(
    post,
    path = "/dbDeletePlayer",
    tag = "players",
    request_body = IdRequest,
    responses((status = 200, description = "Player removed", body = DeletedResponse))
)]
pub async fn delete_player(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<IdRequest>>,
) -> Result<Json<DeletedResponse>, AppError> {
    player_service::delete_player(&state, &request.id).await?;
    Ok(Json(DeletedResponse::done()))
}
