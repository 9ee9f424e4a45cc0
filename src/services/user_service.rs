use tracing::debug;

use crate::{
    dao::models::{UserEntity, UserPatch},
    error::ServiceError,
    state::SharedState,
};

/// Register a user with an empty session history.
pub async fn add_user(
    state: &SharedState,
    id: String,
    name: String,
) -> Result<UserEntity, ServiceError> {
    let repository = state.repository().await?;
    let user = UserEntity::new(id, name);
    repository.create_user(&user).await?;
    debug!(user_id = %user.id, "user created");
    Ok(user)
}

/// User by id, `None` when unknown.
pub async fn get_user(state: &SharedState, id: &str) -> Result<Option<UserEntity>, ServiceError> {
    Ok(state.repository().await?.get_user(id).await?)
}

/// Every registered user.
pub async fn list_users(state: &SharedState) -> Result<Vec<UserEntity>, ServiceError> {
    Ok(state.repository().await?.list_users().await?)
}

/// Record `session_id` in the user's history and make it the active session.
///
/// Read-modify-write without a version check: two concurrent calls for the
/// same user may lose one of the appended ids.
pub async fn update_user(
    state: &SharedState,
    id: &str,
    session_id: String,
) -> Result<Option<UserEntity>, ServiceError> {
    let repository = state.repository().await?;
    let Some(mut user) = repository.get_user(id).await? else {
        return Ok(None);
    };

    user.sessions.push(session_id.clone());
    user.active_session = Some(session_id);

    repository
        .merge_user(
            id,
            &UserPatch {
                sessions: Some(user.sessions.clone()),
                active_session: Some(user.active_session.clone()),
                ..UserPatch::default()
            },
        )
        .await?;
    Ok(Some(user))
}

/// Point the user at `session_id` without touching the session history.
pub async fn update_user_active_session(
    state: &SharedState,
    id: &str,
    session_id: String,
) -> Result<Option<UserEntity>, ServiceError> {
    let repository = state.repository().await?;
    let Some(mut user) = repository.get_user(id).await? else {
        return Ok(None);
    };

    user.active_session = Some(session_id);
    repository
        .merge_user(
            id,
            &UserPatch {
                active_session: Some(user.active_session.clone()),
                ..UserPatch::default()
            },
        )
        .await?;
    Ok(Some(user))
}

/// Drop `session_id` from the history; the first remaining session becomes active.
pub async fn delete_session_from_user(
    state: &SharedState,
    id: &str,
    session_id: &str,
) -> Result<Option<UserEntity>, ServiceError> {
    let repository = state.repository().await?;
    let Some(mut user) = repository.get_user(id).await? else {
        return Ok(None);
    };

    user.sessions.retain(|existing| existing != session_id);
    user.active_session = user.sessions.first().cloned();

    repository
        .merge_user(
            id,
            &UserPatch {
                sessions: Some(user.sessions.clone()),
                active_session: Some(user.active_session.clone()),
                ..UserPatch::default()
            },
        )
        .await?;
    Ok(Some(user))
}

/// Delete a user record; unknown ids succeed.
pub async fn delete_user(state: &SharedState, id: &str) -> Result<(), ServiceError> {
    Ok(state.repository().await?.delete_user(id).await?)
}
