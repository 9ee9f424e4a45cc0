use futures::future::try_join;
use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::{
        models::{NewPlayer, PlayerEntity, SessionEntity, SessionPatch, SessionWithPlayers},
        repository::Repository,
    },
    error::ServiceError,
    state::SharedState,
};

/// Create a session and both of its players, returning the session as stored.
///
/// The session record is written before the players, so a failure part way
/// leaves a session whose players are missing, which later reads report as
/// inconsistent.
pub async fn add_session(
    state: &SharedState,
    players: Vec<NewPlayer>,
) -> Result<SessionWithPlayers, ServiceError> {
    let [first, second]: [NewPlayer; 2] = players.try_into().map_err(|players: Vec<_>| {
        ServiceError::InvalidInput(format!(
            "a session needs exactly two players, got {}",
            players.len()
        ))
    })?;

    let repository = state.repository().await?;
    let session_id = Uuid::new_v4().to_string();
    let first = first.into_entity(Uuid::new_v4().to_string(), &session_id);
    let second = second.into_entity(Uuid::new_v4().to_string(), &session_id);

    repository
        .create_session(&SessionEntity {
            id: session_id.clone(),
            moves_count: 1,
            players: [first.id.clone(), second.id.clone()],
        })
        .await?;
    try_join(
        repository.create_player(first),
        repository.create_player(second),
    )
    .await?;
    debug!(%session_id, "session created");

    get_session_with(&repository, &session_id)
        .await?
        .ok_or_else(|| {
            ServiceError::Inconsistent(format!("session `{session_id}` missing after creation"))
        })
}

/// Session with both players hydrated, `None` when the session does not exist.
pub async fn get_session(
    state: &SharedState,
    id: &str,
) -> Result<Option<SessionWithPlayers>, ServiceError> {
    let repository = state.repository().await?;
    get_session_with(&repository, id).await
}

/// Set the move counter, then return the hydrated session.
pub async fn update_session_moves_count(
    state: &SharedState,
    id: &str,
    moves_count: u32,
) -> Result<Option<SessionWithPlayers>, ServiceError> {
    if moves_count < 1 {
        return Err(ServiceError::InvalidInput(
            "movesCount must be at least 1".into(),
        ));
    }

    let repository = state.repository().await?;
    if repository.get_session_record(id).await?.is_none() {
        return Ok(None);
    }

    repository
        .merge_session(
            id,
            &SessionPatch {
                moves_count: Some(moves_count),
            },
        )
        .await?;
    get_session_with(&repository, id).await
}

/// Delete the session record only; its players are left in place.
pub async fn delete_session(state: &SharedState, id: &str) -> Result<(), ServiceError> {
    Ok(state.repository().await?.delete_session(id).await?)
}

pub(crate) async fn get_session_with(
    repository: &Repository,
    id: &str,
) -> Result<Option<SessionWithPlayers>, ServiceError> {
    match repository.get_session_record(id).await? {
        Some(session) => hydrate_session(repository, session).await.map(Some),
        None => Ok(None),
    }
}

/// Fetch both players of `session` concurrently and wait for both.
///
/// Either fetch failing, or either player being absent or owned by another
/// session, fails the whole aggregation.
pub(crate) async fn hydrate_session(
    repository: &Repository,
    session: SessionEntity,
) -> Result<SessionWithPlayers, ServiceError> {
    let [first_id, second_id] = &session.players;
    let (first, second) = try_join(
        repository.get_player_record(first_id),
        repository.get_player_record(second_id),
    )
    .await?;

    let first = session_member(&session.id, first_id, first)?;
    let second = session_member(&session.id, second_id, second)?;

    Ok(SessionWithPlayers {
        id: session.id,
        moves_count: session.moves_count,
        players: [first, second],
    })
}

fn session_member(
    session_id: &str,
    player_id: &str,
    player: Option<PlayerEntity>,
) -> Result<PlayerEntity, ServiceError> {
    let player = player.ok_or_else(|| {
        ServiceError::Inconsistent(format!(
            "session `{session_id}` references missing player `{player_id}`"
        ))
    })?;

    if player.session != session_id {
        return Err(ServiceError::Inconsistent(format!(
            "player `{player_id}` belongs to session `{}`, not `{session_id}`",
            player.session
        )));
    }
    Ok(player)
}
