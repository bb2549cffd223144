//! Participant entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::Participant;

/// Database row mapping for the participants table.
#[derive(Debug, Clone, FromRow)]
pub struct ParticipantEntity {
    pub id: Uuid,
    pub room_id: Uuid,
    pub display_name: String,
    pub order_index: i32,
    pub is_spectator: bool,
    pub joined_at: DateTime<Utc>,
}

impl From<ParticipantEntity> for Participant {
    fn from(e: ParticipantEntity) -> Self {
        Participant {
            id: e.id,
            room_id: e.room_id,
            display_name: e.display_name,
            order_index: e.order_index,
            is_spectator: e.is_spectator,
            joined_at: e.joined_at,
        }
    }
}
