use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::{
        common::{DeletedResponse, IdRequest, Lookup},
        session::{AddSessionRequest, NewPlayerInput, SessionView, UpdateMovesCountRequest},
    },
    error::AppError,
    services::session_service,
    state::SharedState,
};

/// Session endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/dbAddSession", post(add_session))
        .route("/dbGetSession", post(get_session))
        .route("/dbUpdateSessionMovesCount", post(update_session_moves_count))
        .route("/dbDeleteSession", post(delete_session))
}

/// Create a session from two player definitions.
#[utoipa::path(
    post,
    path = "/dbAddSession",
    tag = "sessions",
    request_body = Vec<NewPlayerInput>,
    responses(
        (status = 200, description = "Created session with both players", body = SessionView),
        (status = 400, description = "Not exactly two players")
    )
)]
pub async fn add_session(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<AddSessionRequest>>,
) -> Result<Json<SessionView>, AppError> {
    let players = request.players.into_iter().map(Into::into).collect();
    let session = session_service::add_session(&state, players).await?;
    Ok(Json(session.into()))
}

/// Fetch a session with both players hydrated.
#[utoipa::path(
    post,
    path = "/dbGetSession",
    tag = "sessions",
    request_body = IdRequest,
    responses(
        (status = 200, description = "Session with hydrated players, or `{\"data\": null}` when unknown", body = SessionView),
        (status = 409, description = "Session references a missing player")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<IdRequest>>,
) -> Result<Json<Lookup<SessionView>>, AppError> {
    let session = session_service::get_session(&state, &request.id).await?;
    Ok(Json(session.map(SessionView::from).into()))
}

/// Set the session move counter.
#[utoipa::path(
    post,
    path = "/dbUpdateSessionMovesCount",
    tag = "sessions",
    request_body = UpdateMovesCountRequest,
    responses((status = 200, description = "Updated session, or `{\"data\": null}` when unknown", body = SessionView))
)]
pub async fn update_session_moves_count(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<UpdateMovesCountRequest>>,
) -> Result<Json<Lookup<SessionView>>, AppError> {
    let session =
        session_service::update_session_moves_count(&state, &request.id, request.moves_count)
            .await?;
    Ok(Json(session.map(SessionView::from).into()))
}

/// Delete a session record; its players are kept.
#[utoipa::path(
    post,
    path = "/dbDeleteSession",
    tag = "sessions",
    request_body = IdRequest,
    responses((status = 200, description = "Session removed", body = DeletedResponse))
)]
pub async fn delete_session(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<IdRequest>>,
) -> Result<Json<DeletedResponse>, AppError> {
    session_service::delete_session(&state, &request.id).await?;
    Ok(Json(DeletedResponse::done()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{http::StatusCode, response::IntoResponse};
    use serde_json::json;

    use super::*;
    use crate::{dao::document_store::MemoryDocumentStore, state::AppState};

    async fn state() -> SharedState {
        AppState::with_store(Arc::new(MemoryDocumentStore::new())).await
    }

    fn add_request(body: serde_json::Value) -> Valid<Json<AddSessionRequest>> {
        Valid(Json(serde_json::from_value(body).unwrap()))
    }

    #[tokio::test]
    async fn created_session_is_serialized_with_hydrated_players() {
        let state = state().await;
        let request = add_request(json!([
            {"userId": "u1", "playerField": [[1, 0]], "targetField": [[0, 0]]},
            {"userId": "u2", "playerField": [[0, 1]], "targetField": [[0, 0]]},
        ]));

        let Json(view) = add_session(State(state), request).await.unwrap();
        let body = serde_json::to_value(view).unwrap();

        assert_eq!(body["movesCount"], json!(1));
        assert_eq!(body["players"][0]["userId"], json!("u1"));
        assert_eq!(body["players"][0]["playerField"], json!([[1, 0]]));
        assert_eq!(body["players"][1]["playerField"], json!([[0, 1]]));
        assert_eq!(body["players"][1]["session"], body["id"]);
    }

    #[tokio::test]
    async fn single_player_session_is_bad_request() {
        let state = state().await;
        let request = add_request(json!([{"userId": "u1"}]));

        let err = add_session(State(state), request).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_session_answers_null_data() {
        let state = state().await;
        let request = Valid(Json(IdRequest { id: "nope".into() }));

        let Json(body) = get_session(State(state), request).await.unwrap();
        assert_eq!(serde_json::to_value(body).unwrap(), json!({"data": null}));
    }
}
