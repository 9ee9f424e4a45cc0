use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the match persistence API.
#[openapi(
    paths(
        crate::routes::health::root,
        crate::routes::health::healthcheck,
        crate::routes::users::add_user,
        crate::routes::users::get_all_users,
        crate::routes::users::get_user,
        crate::routes::users::update_user,
        crate::routes::users::update_user_active_session,
        crate::routes::users::delete_session_from_user,
        crate::routes::users::delete_user,
        crate::routes::sessions::add_session,
        crate::routes::sessions::get_session,
        crate::routes::sessions::update_session_moves_count,
        crate::routes::sessions::delete_session,
        crate::routes::players::get_player,
        crate::routes::players::get_player_by_user_id,
        crate::routes::players::update_player_field,
        crate::routes::players::update_player_target_field,
        crate::routes::players::update_player_ready,
        crate::routes::players::delete_player,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::common::NoData,
            crate::dto::common::CreatedResponse,
            crate::dto::common::DeletedResponse,
            crate::dto::common::IdRequest,
            crate::dto::user::AddUserRequest,
            crate::dto::user::UserSessionRequest,
            crate::dto::user::UserView,
            crate::dto::session::NewPlayerInput,
            crate::dto::session::UpdateMovesCountRequest,
            crate::dto::session::SessionView,
            crate::dto::session::SessionSummary,
            crate::dto::player::PlayerView,
            crate::dto::player::PlayerDetailsView,
            crate::dto::player::UpdatePlayerFieldRequest,
            crate::dto::player::UpdateTargetFieldRequest,
            crate::dto::player::UpdateReadyRequest,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "User accounts and session history"),
        (name = "sessions", description = "Two-player sessions"),
        (name = "players", description = "Per-session player boards"),
    )
)]
pub struct ApiDoc;
