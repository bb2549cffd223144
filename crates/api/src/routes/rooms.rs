//! Room routes: creation, discovery, roster management, host actions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use domain::models::room::{
    CreateRoomRequest, CreateRoomResponse, EndRoomRequest, ListRoomsResponse, Room, RoomDetail,
    RoomKind, RoomPolicy, RoomSummary, Tier, UpdateRoomSettingsRequest,
};
use domain::models::{participant::JoinRoomRequest, participant::LeaveRoomRequest, Participant};
use persistence::entities::RoomEntity;
use persistence::repositories::{
    CreateRoomError, JoinOutcome, NewRoom, ParticipantRepository, RoomRepository,
};
use shared::limit::clamp_list_limit;
use shared::password::{hash_room_password, verify_room_password};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_room_created;

/// Loads an unexpired room or reports not-found. Expired rooms are
/// indistinguishable from rooms that never existed.
pub(crate) async fn load_room(
    repo: &RoomRepository,
    slug: &str,
) -> Result<RoomEntity, ApiError> {
    let slug = shared::slug::normalize(slug);
    if shared::validation::validate_slug(&slug).is_err() {
        // Malformed slugs cannot match any room; skip the lookup
        return Err(ApiError::NotFound("Room not found".to_string()));
    }
    repo.find_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("Room not found".to_string()))
}

/// Create a new room.
///
/// POST /api/v1/rooms
pub async fn create_room(
    State(state): State<AppState>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), ApiError> {
    request.validate()?;

    let tier = request.tier.unwrap_or(Tier::Free);

    let (policy, script_id) = match request.kind {
        RoomKind::ScriptRoom => {
            let script_id = request
                .script_id
                .clone()
                .ok_or_else(|| ApiError::Validation("script_id is required for script rooms".into()))?;
            let script = state
                .catalog
                .get(&script_id)
                .ok_or_else(|| ApiError::InvalidScript(script_id.clone()))?;
            (RoomPolicy::for_script(script), Some(script_id))
        }
        RoomKind::PartyRoom => (RoomPolicy::for_party(tier), None),
    };

    // Script rooms always seat what the script seats; party rooms may
    // request less than the tier allows, never more.
    let max_players = match (request.kind, request.max_players) {
        (RoomKind::PartyRoom, Some(requested)) => {
            if requested > tier.max_players_ceiling() {
                return Err(ApiError::UpgradeRequired(format!(
                    "{} rooms seat at most {} players; upgrade for larger rooms",
                    tier,
                    tier.max_players_ceiling()
                )));
            }
            requested
        }
        _ => policy.max_players,
    };

    let password_hash = request
        .password
        .as_deref()
        .map(hash_room_password)
        .transpose()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let new_room = NewRoom {
        max_players,
        expires_at: policy.expires_at(Utc::now()),
        password_hash,
        party_room: request.kind == RoomKind::PartyRoom,
        script_room: request.kind == RoomKind::ScriptRoom,
        anonymous_mode: request.anonymous_mode,
        script_id,
    };

    let room_repo = RoomRepository::new(state.pool.clone());
    let entity = room_repo
        .create_room(new_room, shared::slug::generate)
        .await
        .map_err(|e| match e {
            CreateRoomError::SlugExhausted => ApiError::ServiceUnavailable(
                "Service temporarily unavailable, please try again".into(),
            ),
            CreateRoomError::Database(e) => e.into(),
        })?;

    record_room_created(entity.party_room);
    info!(
        room_id = %entity.id,
        slug = %entity.slug,
        max_players = entity.max_players,
        "Room created"
    );

    let invite_url = format!("{}/join/{}", state.config.rooms.invite_base_url, entity.slug);

    Ok((
        StatusCode::CREATED,
        Json(CreateRoomResponse {
            room_id: entity.id,
            slug: entity.slug.clone(),
            invite_url,
            expires_at: entity.expires_at,
            max_players: entity.max_players,
            script_id: entity.script_id,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ListRoomsQuery {
    pub limit: Option<i64>,
}

/// List active party rooms for the "join an active party" discovery view.
///
/// GET /api/v1/rooms/active
///
/// Public and read-only; only unexpired party rooms appear.
pub async fn list_active_rooms(
    State(state): State<AppState>,
    Query(query): Query<ListRoomsQuery>,
) -> Result<Json<ListRoomsResponse>, ApiError> {
    let limit = clamp_list_limit(query.limit);
    let room_repo = RoomRepository::new(state.pool.clone());

    let rooms = room_repo.list_active_party_rooms(limit).await?;
    let data = rooms
        .into_iter()
        .map(|r| RoomSummary {
            slug: r.slug,
            expires_at: r.expires_at,
            created_at: r.created_at,
            player_count: r.player_count,
        })
        .collect();

    Ok(Json(ListRoomsResponse { data }))
}

/// Room detail plus ordered roster; the client bootstrap and poll target.
///
/// GET /api/v1/rooms/:slug
pub async fn get_room(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<RoomDetail>, ApiError> {
    let room_repo = RoomRepository::new(state.pool.clone());
    let participant_repo = ParticipantRepository::new(state.pool.clone());

    let entity = load_room(&room_repo, &slug).await?;
    let players = participant_repo
        .list_for_room(entity.id)
        .await?
        .into_iter()
        .map(Participant::from)
        .collect();

    Ok(Json(RoomDetail {
        room: entity.into(),
        players,
    }))
}

/// Join a room (or spectate it).
///
/// POST /api/v1/rooms/:slug/join
///
/// The password check precedes the capacity check; the capacity check
/// counts non-spectators only and is enforced inside the insert.
pub async fn join_room(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(request): Json<JoinRoomRequest>,
) -> Result<(StatusCode, Json<Participant>), ApiError> {
    request.validate()?;

    let room_repo = RoomRepository::new(state.pool.clone());
    let participant_repo = ParticipantRepository::new(state.pool.clone());

    let room = load_room(&room_repo, &slug).await?;

    if let Some(hash) = &room.password_hash {
        let supplied = request.password.as_deref().unwrap_or("");
        let ok = verify_room_password(supplied, hash)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        if !ok {
            return Err(ApiError::WrongPassword);
        }
    }

    let display_name = shared::validation::sanitize_display_name(&request.display_name);

    let entity = match participant_repo
        .join(room.id, &display_name, request.is_spectator, room.max_players)
        .await?
    {
        JoinOutcome::Joined(entity) => entity,
        JoinOutcome::RoomExpired => {
            return Err(ApiError::NotFound("Room not found".to_string()))
        }
        JoinOutcome::RoomFull => return Err(ApiError::RoomFull),
    };

    // First player into a hostless room takes the host seat.
    if !entity.is_spectator && room_repo.claim_host_if_vacant(room.id, entity.id).await? {
        info!(room_id = %room.id, host_id = %entity.id, "Host seat claimed");
    }

    info!(
        room_id = %room.id,
        participant_id = %entity.id,
        order_index = entity.order_index,
        spectator = entity.is_spectator,
        "Participant joined"
    );

    Ok((StatusCode::CREATED, Json(entity.into())))
}

/// Leave a room.
///
/// POST /api/v1/rooms/:slug/leave
///
/// When the host leaves, the seat falls back to the remaining participant
/// with the lowest order index, or the room goes hostless.
pub async fn leave_room(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(request): Json<LeaveRoomRequest>,
) -> Result<StatusCode, ApiError> {
    let room_repo = RoomRepository::new(state.pool.clone());
    let participant_repo = ParticipantRepository::new(state.pool.clone());

    let room = load_room(&room_repo, &slug).await?;
    let participant = participant_repo
        .find(room.id, request.participant_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Participant not found".to_string()))?;

    participant_repo.remove(room.id, participant.id).await?;

    if room.host_id == Some(participant.id) {
        let new_host = room_repo.reassign_host(room.id).await?;
        match new_host {
            Some(host_id) => info!(room_id = %room.id, host_id = %host_id, "Host reassigned"),
            None => info!(room_id = %room.id, "Room is now hostless"),
        }
    }

    info!(room_id = %room.id, participant_id = %participant.id, "Participant left");

    Ok(StatusCode::NO_CONTENT)
}

/// End a room early. Host-only.
///
/// POST /api/v1/rooms/:slug/end
pub async fn end_room(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(request): Json<EndRoomRequest>,
) -> Result<StatusCode, ApiError> {
    let room_repo = RoomRepository::new(state.pool.clone());

    let room = load_room(&room_repo, &slug).await?;
    if room.host_id != Some(request.requester_id) {
        return Err(ApiError::Forbidden(
            "Only the host may end the room".to_string(),
        ));
    }

    let ended = room_repo.end_room(room.id).await?;
    if ended == 0 {
        return Err(ApiError::NotFound("Room not found".to_string()));
    }

    info!(room_id = %room.id, slug = %room.slug, "Room ended by host");

    Ok(StatusCode::NO_CONTENT)
}

/// Toggle host-only room settings.
///
/// PATCH /api/v1/rooms/:slug/settings
pub async fn update_settings(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(request): Json<UpdateRoomSettingsRequest>,
) -> Result<Json<Room>, ApiError> {
    let room_repo = RoomRepository::new(state.pool.clone());

    let room = load_room(&room_repo, &slug).await?;
    if room.host_id != Some(request.requester_id) {
        return Err(ApiError::Forbidden(
            "Only the host may change room settings".to_string(),
        ));
    }

    if let Some(on) = request.anonymous_mode {
        room_repo.set_anonymous_mode(room.id, on).await?;
        info!(room_id = %room.id, anonymous_mode = on, "Room settings updated");
    }

    let updated = load_room(&room_repo, &room.slug).await?;
    Ok(Json(updated.into()))
}
