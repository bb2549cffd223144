//! Room repository for database operations.
//!
//! Slug uniqueness is enforced by the unique index on `rooms.slug`;
//! expired rows are cleaned up lazily when their slug is drawn again.
//! Every read filters on `expires_at`, so an expired room is
//! indistinguishable from one that never existed.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{RoomEntity, RoomSummaryEntity};
use crate::metrics::QueryTimer;

/// Bound on slug generation attempts per room creation. Exhaustion is a
/// terminal error, distinct from transient store failures.
pub const SLUG_ATTEMPTS: u32 = 5;

/// Parameters for inserting a room row.
#[derive(Debug, Clone)]
pub struct NewRoom {
    pub max_players: i32,
    pub expires_at: DateTime<Utc>,
    pub password_hash: Option<String>,
    pub party_room: bool,
    pub script_room: bool,
    pub anonymous_mode: bool,
    pub script_id: Option<String>,
}

/// Raised when `SLUG_ATTEMPTS` consecutive slugs were already taken.
#[derive(Debug, thiserror::Error)]
pub enum CreateRoomError {
    #[error("Could not allocate a unique room slug")]
    SlugExhausted,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Repository for room-related database operations.
#[derive(Clone)]
pub struct RoomRepository {
    pool: PgPool,
}

impl RoomRepository {
    /// Creates a new RoomRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a room, drawing slugs from `generator` until one inserts
    /// cleanly. Bounded at [`SLUG_ATTEMPTS`] tries; unique-index collisions
    /// count as failed attempts, so two creators racing on the same slug
    /// cannot both win.
    pub async fn create_room<F>(
        &self,
        room: NewRoom,
        generator: F,
    ) -> Result<RoomEntity, CreateRoomError>
    where
        F: Fn() -> String,
    {
        for _ in 0..SLUG_ATTEMPTS {
            let slug = generator();

            // An expired room may still hold the slug; release it first.
            self.delete_if_expired(&slug).await?;

            match self.insert_room(&slug, &room).await {
                Ok(entity) => return Ok(entity),
                Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => {
                    tracing::debug!(slug = %slug, "Slug collision, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CreateRoomError::SlugExhausted)
    }

    async fn insert_room(&self, slug: &str, room: &NewRoom) -> Result<RoomEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_room");
        let result = sqlx::query_as::<_, RoomEntity>(
            r#"
            INSERT INTO rooms (slug, max_players, expires_at, password_hash,
                               party_room, script_room, anonymous_mode, script_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, slug, host_id, max_players, expires_at, password_hash,
                      party_room, script_room, anonymous_mode, script_id,
                      join_counter, created_at
            "#,
        )
        .bind(slug)
        .bind(room.max_players)
        .bind(room.expires_at)
        .bind(&room.password_hash)
        .bind(room.party_room)
        .bind(room.script_room)
        .bind(room.anonymous_mode)
        .bind(&room.script_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    async fn delete_if_expired(&self, slug: &str) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_expired_room");
        let result = sqlx::query(
            r#"
            DELETE FROM rooms WHERE slug = $1 AND expires_at <= $2
            "#,
        )
        .bind(slug)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Find an unexpired room by slug. Expired rooms come back as `None`.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<RoomEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_room_by_slug");
        let result = sqlx::query_as::<_, RoomEntity>(
            r#"
            SELECT id, slug, host_id, max_players, expires_at, password_hash,
                   party_room, script_room, anonymous_mode, script_id,
                   join_counter, created_at
            FROM rooms
            WHERE slug = $1 AND expires_at > $2
            "#,
        )
        .bind(slug)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List unexpired party rooms for public discovery, newest first,
    /// with live non-spectator player counts.
    pub async fn list_active_party_rooms(
        &self,
        limit: i64,
    ) -> Result<Vec<RoomSummaryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_active_party_rooms");
        let result = sqlx::query_as::<_, RoomSummaryEntity>(
            r#"
            SELECT r.slug, r.expires_at, r.created_at,
                   (SELECT COUNT(*) FROM participants p
                    WHERE p.room_id = r.id AND NOT p.is_spectator) AS player_count
            FROM rooms r
            WHERE r.party_room AND r.expires_at > $1
            ORDER BY r.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(Utc::now())
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// End a room now by moving its expiry into the past for all readers.
    pub async fn end_room(&self, room_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("end_room");
        let result = sqlx::query(
            r#"
            UPDATE rooms SET expires_at = $2 WHERE id = $1 AND expires_at > $2
            "#,
        )
        .bind(room_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Host settings toggle.
    pub async fn set_anonymous_mode(&self, room_id: Uuid, on: bool) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("set_anonymous_mode");
        let result = sqlx::query(
            r#"
            UPDATE rooms SET anonymous_mode = $2 WHERE id = $1
            "#,
        )
        .bind(room_id)
        .bind(on)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Seat the given participant as host if the room is currently
    /// hostless. Conditional, so two first joiners cannot both claim it.
    pub async fn claim_host_if_vacant(
        &self,
        room_id: Uuid,
        participant_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("claim_host_if_vacant");
        let result = sqlx::query(
            r#"
            UPDATE rooms SET host_id = $2 WHERE id = $1 AND host_id IS NULL
            "#,
        )
        .bind(room_id)
        .bind(participant_id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// Reassign the host seat to the remaining non-spectator participant
    /// with the lowest order index, or clear it if none remain. Returns the
    /// new host id.
    pub async fn reassign_host(&self, room_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
        let timer = QueryTimer::new("reassign_host");
        let result = sqlx::query_scalar::<_, Option<Uuid>>(
            r#"
            UPDATE rooms
            SET host_id = (
                SELECT id FROM participants
                WHERE room_id = $1 AND NOT is_spectator
                ORDER BY order_index ASC
                LIMIT 1
            )
            WHERE id = $1
            RETURNING host_id
            "#,
        )
        .bind(room_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}

#[cfg(test)]
mod tests {
    // Note: RoomRepository methods require a database connection and are
    // covered by integration tests against a live Postgres.

    #[test]
    fn test_slug_attempt_bound() {
        assert_eq!(super::SLUG_ATTEMPTS, 5);
    }
}
