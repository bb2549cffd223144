//! Room entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::Room;

/// Database row mapping for the rooms table.
#[derive(Debug, Clone, FromRow)]
pub struct RoomEntity {
    pub id: Uuid,
    pub slug: String,
    pub host_id: Option<Uuid>,
    pub max_players: i32,
    pub expires_at: DateTime<Utc>,
    pub password_hash: Option<String>,
    pub party_room: bool,
    pub script_room: bool,
    pub anonymous_mode: bool,
    pub script_id: Option<String>,
    /// Monotonic per-room counter handing out order indices; bumping it
    /// also serializes joins on the room row.
    pub join_counter: i32,
    pub created_at: DateTime<Utc>,
}

impl From<RoomEntity> for Room {
    fn from(e: RoomEntity) -> Self {
        Room {
            id: e.id,
            slug: e.slug,
            host_id: e.host_id,
            max_players: e.max_players,
            expires_at: e.expires_at,
            party_room: e.party_room,
            script_room: e.script_room,
            anonymous_mode: e.anonymous_mode,
            script_id: e.script_id,
            has_password: e.password_hash.is_some(),
            created_at: e.created_at,
        }
    }
}

/// Row shape of the public active-rooms listing.
#[derive(Debug, Clone, FromRow)]
pub struct RoomSummaryEntity {
    pub slug: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub player_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_conversion_hides_password_hash() {
        let entity = RoomEntity {
            id: Uuid::new_v4(),
            slug: "ABC-DEF".into(),
            host_id: None,
            max_players: 4,
            expires_at: Utc::now(),
            password_hash: Some("$argon2id$...".into()),
            party_room: true,
            script_room: false,
            anonymous_mode: false,
            script_id: None,
            join_counter: 0,
            created_at: Utc::now(),
        };
        let room: Room = entity.into();
        assert!(room.has_password);
        // Room carries only the boolean; the hash never leaves this crate.
    }
}
