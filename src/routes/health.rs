use axum::{Json, Router, extract::State, routing::get};

use crate::{dto::health::HealthResponse, services::health_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses((status = 200, description = "Liveness greeting", body = String))
)]
/// Plain-text greeting kept for clients that probe the root path.
pub async fn root() -> &'static str {
    "Hello World!"
}

#[utoipa::path(
    get,
    path = "/healthcheck",
    tag = "health",
    responses((status = 200, description = "Storage status", body = HealthResponse))
)]
/// Return the current health status of the backend and probe the document store.
pub async fn healthcheck(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(health_service::health_status(&state).await)
}

/// Configure the health routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/", get(root))
        .route("/healthcheck", get(healthcheck))
}
