use axum::Router;

use crate::state::SharedState;

/// Swagger UI.
pub mod docs;
/// Liveness and health routes.
pub mod health;
/// `/db*Player*` routes.
pub mod players;
/// `/db*Session*` routes.
pub mod sessions;
/// `/db*User*` routes.
pub mod users;

/// Compose the RPC-style routes and the documentation UI over the shared state.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(users::router())
        .merge(sessions::router())
        .merge(players::router())
        .merge(docs::router())
        .with_state(state)
}
