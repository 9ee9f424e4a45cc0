use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::{
        common::{CreatedResponse, DeletedResponse, IdRequest, Lookup},
        user::{AddUserRequest, UserSessionRequest, UserView},
    },
    error::AppError,
    services::user_service,
    state::SharedState,
};

/// User account endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/dbAddUser", post(add_user))
        .route("/dbGetAllUsers", post(get_all_users))
        .route("/dbGetUser", post(get_user))
        .route("/dbUpdateUser", post(update_user))
        .route("/dbUpdateUserActiveSession", post(update_user_active_session))
        .route("/dbDeleteSessionFromUser", post(delete_session_from_user))
        .route("/dbDeleteUser", post(delete_user))
}

/// Register a user with an empty session history.
#[utoipa::path(
    post,
    path = "/dbAddUser",
    tag = "users",
    request_body = AddUserRequest,
    responses((status = 200, description = "User stored", body = CreatedResponse))
)]
pub async fn add_user(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<AddUserRequest>>,
) -> Result<Json<CreatedResponse>, AppError> {
    user_service::add_user(&state, request.id, request.name).await?;
    Ok(Json(CreatedResponse::ok()))
}

/// List every registered user.
#[utoipa::path(
    post,
    path = "/dbGetAllUsers",
    tag = "users",
    responses((status = 200, description = "Every registered user", body = [UserView]))
)]
pub async fn get_all_users(
    State(state): State<SharedState>,
) -> Result<Json<Vec<UserView>>, AppError> {
    let users = user_service::list_users(&state).await?;
    Ok(Json(users.into_iter().map(UserView::from).collect()))
}

/// Fetch a user by id.
#[utoipa::path(
    post,
    path = "/dbGetUser",
    tag = "users",
    request_body = IdRequest,
    responses(
        (status = 200, description = "The user, or `{\"data\": null}` when unknown", body = UserView),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn get_user(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<IdRequest>>,
) -> Result<Json<Lookup<UserView>>, AppError> {
    let user = user_service::get_user(&state, &request.id).await?;
    Ok(Json(user.map(UserView::from).into()))
}

/// Append a session to the user's history and make it active.
#[utoipa::path(
    post,
    path = "/dbUpdateUser",
    tag = "users",
    request_body = UserSessionRequest,
    responses((status = 200, description = "Updated user, or `{\"data\": null}` when unknown", body = UserView))
)]
pub async fn update_user(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<UserSessionRequest>>,
) -> Result<Json<Lookup<UserView>>, AppError> {
    let user = user_service::update_user(&state, &request.id, request.session_id).await?;
    Ok(Json(user.map(UserView::from).into()))
}

/// Point a user at the session they are playing.
#[utoipa::path(
    post,
    path = "/dbUpdateUserActiveSession",
    tag = "users",
    request_body = UserSessionRequest,
    responses((status = 200, description = "Updated user, or `{\"data\": null}` when unknown", body = UserView))
)]
pub async fn update_user_active_session(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<UserSessionRequest>>,
) -> Result<Json<Lookup<UserView>>, AppError> {
    let user =
        user_service::update_user_active_session(&state, &request.id, request.session_id).await?;
    Ok(Json(user.map(UserView::from).into()))
}

/// Remove a session from the user's history and recompute the active session.
#[utoipa::path(
    post,
    path = "/dbDeleteSessionFromUser",
    tag = "users",
    request_body = UserSessionRequest,
    responses((status = 200, description = "Session removed, or `{\"data\": null}` when the user is unknown", body = DeletedResponse))
)]
pub async fn delete_session_from_user(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<UserSessionRequest>>,
) -> Result<Json<Lookup<DeletedResponse>>, AppError> {
    let user =
        user_service::delete_session_from_user(&state, &request.id, &request.session_id).await?;
    Ok(Json(user.map(|_| DeletedResponse::done()).into()))
}

/// Delete a user record.
#[utoipa::path(
    post,
    path = "/dbDeleteUser",
    tag = "users",
    request_body = IdRequest,
    responses((status = 200, description = "User removed", body = DeletedResponse))
)]
pub async fn delete_user(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<IdRequest>>,
) -> Result<Json<DeletedResponse>, AppError> {
    user_service::delete_user(&state, &request.id).await?;
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

    fn id(value: &str) -> Valid<Json<IdRequest>> {
        Valid(Json(IdRequest { id: value.into() }))
    }

    #[tokio::test]
    async fn unknown_user_answers_null_data() {
        let state = state().await;

        let Json(body) = get_user(State(state), id("ghost")).await.unwrap();
        assert_eq!(serde_json::to_value(body).unwrap(), json!({"data": null}));
    }

    #[tokio::test]
    async fn added_user_is_returned() {
        let state = state().await;
        let request = AddUserRequest {
            id: "u1".into(),
            name: "A".into(),
        };

        let Json(created) = add_user(State(state.clone()), Valid(Json(request)))
            .await
            .unwrap();
        assert_eq!(created.status, "ok");

        let Json(body) = get_user(State(state), id("u1")).await.unwrap();
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"id": "u1", "name": "A", "sessions": [], "activeSession": null})
        );
    }

    #[tokio::test]
    async fn delete_session_from_unknown_user_answers_null_data() {
        let state = state().await;
        let request = UserSessionRequest {
            id: "ghost".into(),
            session_id: "s1".into(),
        };

        let Json(body) = delete_session_from_user(State(state), Valid(Json(request)))
            .await
            .unwrap();
        assert!(matches!(body, Lookup::Missing(_)));
    }

    #[tokio::test]
    async fn degraded_state_is_service_unavailable() {
        let state = AppState::new();

        let err = get_user(State(state), id("u1")).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
