//! Game-state routes: snapshot reads and version-checked transitions.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use tracing::info;

use domain::models::game_state::{
    GameAction, GameId, GamePayload, GameStateDocument, GameStateResponse, TransitionRequest,
};
use domain::models::RosterEntry;
use domain::services::{apply_action, ActionContext};
use persistence::entities::GameStateEntity;
use persistence::repositories::{GameStateRepository, ParticipantRepository, RoomRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::{record_transition_applied, record_version_conflict};
use crate::routes::rooms::load_room;

/// Reads the current document, creating the version-0 default for known
/// game ids on first access. Unknown ids only exist once written.
async fn read_document(
    repo: &GameStateRepository,
    room_id: uuid::Uuid,
    game_id: &GameId,
) -> Result<GameStateEntity, ApiError> {
    match GamePayload::default_for(game_id) {
        Some(default) => {
            let payload = default
                .to_value()
                .map_err(|e| ApiError::Internal(e.to_string()))?;
            Ok(repo.read_or_create(room_id, game_id.as_str(), &payload).await?)
        }
        None => repo
            .find(room_id, game_id.as_str())
            .await?
            .ok_or_else(|| ApiError::NotFound("No state for this game".to_string())),
    }
}

/// Game-state snapshot.
///
/// GET /api/v1/rooms/:slug/state/:game_id
pub async fn get_game_state(
    State(state): State<AppState>,
    Path((slug, game_id)): Path<(String, String)>,
) -> Result<Json<GameStateResponse>, ApiError> {
    let room_repo = RoomRepository::new(state.pool.clone());
    let state_repo = GameStateRepository::new(state.pool.clone());

    let room = load_room(&room_repo, &slug).await?;
    let game_id: GameId = game_id.parse().expect("GameId::from_str is infallible");

    let entity = read_document(&state_repo, room.id, &game_id).await?;

    Ok(Json(GameStateResponse {
        version: entity.version,
        payload: entity.payload,
    }))
}

/// Apply one state transition through the version compare-and-swap.
///
/// POST /api/v1/rooms/:slug/state/:game_id
///
/// The transition is validated against the live roster, applied to the
/// payload read at `expected_version`, and persisted only if the stored
/// version has not moved. Losers of the race receive a version conflict
/// and are expected to re-read and retry.
pub async fn post_transition(
    State(state): State<AppState>,
    Path((slug, game_id)): Path<(String, String)>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<GameStateResponse>, ApiError> {
    let room_repo = RoomRepository::new(state.pool.clone());
    let participant_repo = ParticipantRepository::new(state.pool.clone());
    let state_repo = GameStateRepository::new(state.pool.clone());

    let room = load_room(&room_repo, &slug).await?;
    let game_id: GameId = game_id.parse().expect("GameId::from_str is infallible");

    let current = read_document(&state_repo, room.id, &game_id).await?;
    if current.version != request.expected_version {
        record_version_conflict(game_id.as_str());
        return Err(ApiError::VersionConflict);
    }

    let document =
        GameStateDocument::decode(room.id, game_id.clone(), current.version, current.payload)
            .map_err(|e| ApiError::Internal(format!("Stored state is unreadable: {}", e)))?;

    let roster: Vec<RosterEntry> = participant_repo
        .list_for_room(room.id)
        .await?
        .iter()
        .map(|e| RosterEntry {
            id: e.id,
            order_index: e.order_index,
            is_spectator: e.is_spectator,
        })
        .collect();

    // Script actions validate against the script named at start (or being
    // started); a script missing from the catalog is a client input error.
    let script_id = match (&document.payload, &request.action) {
        (GamePayload::Script(_), GameAction::StartGame { script_id }) => Some(script_id.clone()),
        (GamePayload::Script(s), _) => s.script_id.clone(),
        _ => None,
    };
    let script = script_id
        .map(|id| {
            state
                .catalog
                .get(&id)
                .ok_or_else(|| ApiError::InvalidScript(id.clone()))
        })
        .transpose()?;

    let ctx = ActionContext {
        requester: request.participant_id,
        roster: &roster,
        room_host: room.host_id,
        script,
        now: Utc::now(),
    };

    let next = apply_action(&document.payload, &request.action, &ctx, &mut rand::thread_rng())?;
    let next_value = next
        .to_value()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let written = state_repo
        .write_cas(room.id, game_id.as_str(), request.expected_version, &next_value)
        .await?;

    let Some(entity) = written else {
        record_version_conflict(game_id.as_str());
        return Err(ApiError::VersionConflict);
    };

    record_transition_applied(game_id.as_str());
    info!(
        room_id = %room.id,
        game = %game_id,
        version = entity.version,
        participant_id = %request.participant_id,
        "State transition applied"
    );

    Ok(Json(GameStateResponse {
        version: entity.version,
        payload: entity.payload,
    }))
}
