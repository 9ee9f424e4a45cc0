use serde_json::Value;

use crate::{
    dao::{
        models::{PlayerPatch, PlayerWithSession},
        repository::Repository,
    },
    error::ServiceError,
    services::session_service::hydrate_session,
    state::SharedState,
};

/// Player together with its parent session, `None` when the player does not exist.
pub async fn get_player(
    state: &SharedState,
    id: &str,
) -> Result<Option<PlayerWithSession>, ServiceError> {
    let repository = state.repository().await?;
    get_player_with(&repository, id).await
}

/// Follow user → active session → session → player, stopping at the first missing link.
pub async fn get_player_by_user_id(
    state: &SharedState,
    user_id: &str,
) -> Result<Option<PlayerWithSession>, ServiceError> {
    let repository = state.repository().await?;

    let Some(user) = repository.get_user(user_id).await? else {
        return Ok(None);
    };
    let Some(active_session) = user.active_session else {
        return Ok(None);
    };
    let Some(record) = repository.get_session_record(&active_session).await? else {
        return Ok(None);
    };

    // Players were fetched by the ids `record` lists, and hydration checked their back-references.
    let session = hydrate_session(&repository, record.clone()).await?;
    let player = session
        .players
        .into_iter()
        .find(|player| player.user_id == user_id);

    Ok(player.map(|player| PlayerWithSession {
        player,
        session: record,
    }))
}

/// Replace the player's own board and return the player with its session.
pub async fn update_player_field(
    state: &SharedState,
    id: &str,
    player_field: Value,
) -> Result<Option<PlayerWithSession>, ServiceError> {
    update_player(
        state,
        id,
        PlayerPatch {
            player_field: Some(player_field),
            ..PlayerPatch::default()
        },
    )
    .await
}

/// Replace the player's opponent board view.
pub async fn update_player_target_field(
    state: &SharedState,
    id: &str,
    target_field: Value,
) -> Result<Option<PlayerWithSession>, ServiceError> {
    update_player(
        state,
        id,
        PlayerPatch {
            target_field: Some(target_field),
            ..PlayerPatch::default()
        },
    )
    .await
}

/// Set the ready flag.
pub async fn update_player_ready(
    state: &SharedState,
    id: &str,
    ready: bool,
) -> Result<Option<PlayerWithSession>, ServiceError> {
    update_player(
        state,
        id,
        PlayerPatch {
            ready: Some(ready),
            ..PlayerPatch::default()
        },
    )
    .await
}

/// Delete a player record; its session keeps referencing it.
pub async fn delete_player(state: &SharedState, id: &str) -> Result<(), ServiceError> {
    Ok(state.repository().await?.delete_player(id).await?)
}

/// Merge `patch` into an existing player and read it back with its session.
async fn update_player(
    state: &SharedState,
    id: &str,
    patch: PlayerPatch,
) -> Result<Option<PlayerWithSession>, ServiceError> {
    let repository = state.repository().await?;
    if repository.get_player_record(id).await?.is_none() {
        return Ok(None);
    }

    repository.merge_player(id, &patch).await?;
    get_player_with(&repository, id).await
}

async fn get_player_with(
    repository: &Repository,
    id: &str,
) -> Result<Option<PlayerWithSession>, ServiceError> {
    let Some(player) = repository.get_player_record(id).await? else {
        return Ok(None);
    };

    let session = repository
        .get_session_record(&player.session)
        .await?
        .ok_or_else(|| {
            ServiceError::Inconsistent(format!(
                "player `{id}` references missing session `{}`",
                player.session
            ))
        })?;

    if !session.players.contains(&player.id) {
        return Err(ServiceError::Inconsistent(format!(
            "session `{}` does not list player `{id}`",
            session.id
        )));
    }

    Ok(Some(PlayerWithSession { player, session }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{
        dao::{
            document_store::{Collection, DocumentStore, MemoryDocumentStore},
            models::{NewPlayer, SessionWithPlayers},
        },
        services::{session_service, user_service},
        state::AppState,
    };

    async fn state() -> (MemoryDocumentStore, SharedState) {
        let store = MemoryDocumentStore::new();
        let state = AppState::with_store(Arc::new(store.clone())).await;
        (store, state)
    }

    async fn session(state: &SharedState) -> SessionWithPlayers {
        let players = ["u1", "u2"]
            .into_iter()
            .map(|user_id| NewPlayer {
                user_id: user_id.into(),
                ..NewPlayer::default()
            })
            .collect();
        session_service::add_session(state, players).await.unwrap()
    }

    #[tokio::test]
    async fn player_comes_with_parent_session() {
        let (_, state) = state().await;
        let created = session(&state).await;
        let first = &created.players[0];

        let found = get_player(&state, &first.id).await.unwrap().unwrap();
        assert_eq!(&found.player, first);
        assert_eq!(found.session.id, created.id);
        assert_eq!(found.session.moves_count, 1);
        assert_eq!(
            found.session.players,
            [created.players[0].id.clone(), created.players[1].id.clone()]
        );
    }

    #[tokio::test]
    async fn unknown_player_is_none() {
        let (_, state) = state().await;
        assert_eq!(get_player(&state, "ghost").await.unwrap(), None);
        assert_eq!(
            update_player_ready(&state, "ghost", true).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn player_field_round_trips() {
        let (_, state) = state().await;
        let created = session(&state).await;
        let id = &created.players[1].id;
        let board = json!({"rows": [[0, 1, 0], [1, 1, 0]], "sunk": ["cruiser"]});

        let updated = update_player_field(&state, id, board.clone())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.player.player_field, board);

        let fetched = get_player(&state, id).await.unwrap().unwrap();
        assert_eq!(fetched.player.player_field, board);
        assert_eq!(fetched.player.target_field, Value::Null);
    }

    #[tokio::test]
    async fn single_field_updates_leave_other_fields() {
        let (_, state) = state().await;
        let created = session(&state).await;
        let id = &created.players[0].id;

        update_player_target_field(&state, id, json!([[1]]))
            .await
            .unwrap();
        let updated = update_player_ready(&state, id, true).await.unwrap().unwrap();

        assert!(updated.player.ready);
        assert_eq!(updated.player.target_field, json!([[1]]));
        assert_eq!(updated.player.user_id, "u1");
    }

    #[tokio::test]
    async fn missing_parent_session_is_inconsistent() {
        let (_, state) = state().await;
        let created = session(&state).await;
        session_service::delete_session(&state, &created.id)
            .await
            .unwrap();

        let err = get_player(&state, &created.players[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Inconsistent(_)));
    }

    #[tokio::test]
    async fn session_not_listing_player_is_inconsistent() {
        let (store, state) = state().await;
        let created = session(&state).await;

        let Value::Object(fields) = json!({"players": ["someone-else", created.players[1].id]})
        else {
            unreachable!()
        };
        store
            .merge(Collection::Sessions, &created.id, fields)
            .await
            .unwrap();

        let err = get_player(&state, &created.players[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Inconsistent(_)));
    }

    #[tokio::test]
    async fn player_by_user_follows_active_session() {
        let (_, state) = state().await;
        let created = session(&state).await;
        user_service::add_user(&state, "u2".into(), "B".into())
            .await
            .unwrap();
        user_service::update_user(&state, "u2", created.id.clone())
            .await
            .unwrap();

        let found = get_player_by_user_id(&state, "u2").await.unwrap().unwrap();
        assert_eq!(found.player, created.players[1]);
        assert_eq!(found.session.id, created.id);
    }

    #[tokio::test]
    async fn player_by_user_without_active_session_skips_session_lookup() {
        let (store, state) = state().await;
        user_service::add_user(&state, "u1".into(), "A".into())
            .await
            .unwrap();

        let before = store.read_count(Collection::Sessions);
        assert_eq!(get_player_by_user_id(&state, "u1").await.unwrap(), None);
        assert_eq!(store.read_count(Collection::Sessions), before);
    }

    #[tokio::test]
    async fn player_by_user_stops_at_missing_links() {
        let (_, state) = state().await;
        assert_eq!(get_player_by_user_id(&state, "ghost").await.unwrap(), None);

        user_service::add_user(&state, "u3".into(), "C".into())
            .await
            .unwrap();
        user_service::update_user(&state, "u3", "no-such-session".into())
            .await
            .unwrap();
        assert_eq!(get_player_by_user_id(&state, "u3").await.unwrap(), None);

        let created = session(&state).await;
        user_service::update_user_active_session(&state, "u3", created.id)
            .await
            .unwrap();
        assert_eq!(get_player_by_user_id(&state, "u3").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_player_is_idempotent() {
        let (store, state) = state().await;
        let created = session(&state).await;
        let id = &created.players[0].id;

        delete_player(&state, id).await.unwrap();
        delete_player(&state, id).await.unwrap();
        assert!(store.get(Collection::Players, id).await.unwrap().is_none());
    }
}
