//! Game-state entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the game_states table. One row per
/// `(room_id, game_id)`; the version column backs the compare-and-swap.
#[derive(Debug, Clone, FromRow)]
pub struct GameStateEntity {
    pub room_id: Uuid,
    pub game_id: String,
    pub version: i64,
    pub payload: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}
