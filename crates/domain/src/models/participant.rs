//! Participant domain models: roster entries, join/leave payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A participant in a room. The id is device/session scoped, not a durable
/// account identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Participant {
    pub id: Uuid,
    pub room_id: Uuid,
    pub display_name: String,
    /// Join order; drives turn-based mechanics and host fallback.
    pub order_index: i32,
    pub is_spectator: bool,
    pub joined_at: DateTime<Utc>,
}

/// The slice of a participant the state machines care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterEntry {
    pub id: Uuid,
    pub order_index: i32,
    pub is_spectator: bool,
}

impl From<&Participant> for RosterEntry {
    fn from(p: &Participant) -> Self {
        Self {
            id: p.id,
            order_index: p.order_index,
            is_spectator: p.is_spectator,
        }
    }
}

/// Request payload for joining a room.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct JoinRoomRequest {
    #[validate(custom(function = "shared::validation::validate_display_name"))]
    pub display_name: String,

    /// Required when the room has a password; ignored otherwise.
    pub password: Option<String>,

    /// Spectators bypass the capacity check and never hold the host seat.
    #[serde(default)]
    pub is_spectator: bool,
}

/// Request payload for leaving a room.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LeaveRoomRequest {
    pub participant_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_entry_from_participant() {
        let p = Participant {
            id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            display_name: "Alice".into(),
            order_index: 2,
            is_spectator: false,
            joined_at: Utc::now(),
        };
        let entry = RosterEntry::from(&p);
        assert_eq!(entry.id, p.id);
        assert_eq!(entry.order_index, 2);
        assert!(!entry.is_spectator);
    }

    #[test]
    fn test_join_request_validation() {
        let valid = JoinRoomRequest {
            display_name: "Alice".into(),
            password: None,
            is_spectator: false,
        };
        assert!(valid.validate().is_ok());

        let empty_name = JoinRoomRequest {
            display_name: "   ".into(),
            password: None,
            is_spectator: false,
        };
        assert!(empty_name.validate().is_err());

        let too_long = JoinRoomRequest {
            display_name: "x".repeat(40),
            password: None,
            is_spectator: false,
        };
        assert!(too_long.validate().is_err());
    }
}
