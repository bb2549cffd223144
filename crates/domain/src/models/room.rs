//! Room domain models: the ephemeral multiplayer session and its
//! creation-time capacity/expiry policy.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::script::ScriptDefinition;

/// Subscription tier of the room creator. Computed elsewhere (payments are
/// out of scope) and consumed here as an input to the capacity policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Standard,
    Premium,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Standard => "standard",
            Tier::Premium => "premium",
        }
    }

    /// The largest room this tier is entitled to host.
    pub fn max_players_ceiling(&self) -> i32 {
        match self {
            Tier::Free => 4,
            Tier::Standard => 8,
            Tier::Premium => 12,
        }
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "standard" => Ok(Tier::Standard),
            "premium" => Ok(Tier::Premium),
            _ => Err(format!("Invalid tier: {}", s)),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of room being created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    PartyRoom,
    ScriptRoom,
}

/// Capacity and expiry computed at creation time from mode + tier.
/// Immutable for the life of the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomPolicy {
    pub max_players: i32,
    pub ttl: Duration,
}

impl RoomPolicy {
    /// Policy for a party room by tier: free rooms are 4 players for
    /// 30 minutes, standard 8 players for 2 hours, premium 12 players
    /// for 24 hours.
    pub fn for_party(tier: Tier) -> Self {
        match tier {
            Tier::Free => Self {
                max_players: 4,
                ttl: Duration::minutes(30),
            },
            Tier::Standard => Self {
                max_players: 8,
                ttl: Duration::hours(2),
            },
            Tier::Premium => Self {
                max_players: 12,
                ttl: Duration::hours(24),
            },
        }
    }

    /// Policy for a script room: capacity comes from the script metadata,
    /// expiry is a flat 2 hours.
    pub fn for_script(script: &ScriptDefinition) -> Self {
        Self {
            max_players: script.max_players,
            ttl: Duration::hours(2),
        }
    }

    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.ttl
    }
}

/// An ephemeral multiplayer session identified by a slug.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Room {
    pub id: Uuid,
    pub slug: String,
    /// Nullable: rooms may be (or become) hostless.
    pub host_id: Option<Uuid>,
    pub max_players: i32,
    pub expires_at: DateTime<Utc>,
    pub party_room: bool,
    pub script_room: bool,
    pub anonymous_mode: bool,
    pub script_id: Option<String>,
    pub has_password: bool,
    pub created_at: DateTime<Utc>,
}

impl Room {
    /// A room past its expiry is treated as non-existent by all reads.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Request payload for creating a room.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateRoomRequest {
    pub kind: RoomKind,

    /// Optional 4-digit room password.
    #[validate(custom(function = "shared::validation::validate_room_password"))]
    pub password: Option<String>,

    /// Requested capacity; must not exceed the tier ceiling.
    #[validate(range(min = 2, max = 12, message = "max_players must be between 2 and 12"))]
    pub max_players: Option<i32>,

    /// Required when kind is script_room.
    pub script_id: Option<String>,

    #[serde(default)]
    pub anonymous_mode: bool,

    /// Tier of the creator; defaults to free.
    pub tier: Option<Tier>,
}

/// Response after creating a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CreateRoomResponse {
    pub room_id: Uuid,
    pub slug: String,
    pub invite_url: String,
    pub expires_at: DateTime<Utc>,
    pub max_players: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_id: Option<String>,
}

/// Summary of a discoverable room for the public active-rooms listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RoomSummary {
    pub slug: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub player_count: i64,
}

/// Response for the active-rooms listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListRoomsResponse {
    pub data: Vec<RoomSummary>,
}

/// Room plus ordered roster, the bootstrap and poll target for clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RoomDetail {
    pub room: Room,
    pub players: Vec<super::participant::Participant>,
}

/// Host-only settings toggles.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UpdateRoomSettingsRequest {
    pub requester_id: Uuid,
    pub anonymous_mode: Option<bool>,
}

/// Host-only request to end a room early.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EndRoomRequest {
    pub requester_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ceilings() {
        assert_eq!(Tier::Free.max_players_ceiling(), 4);
        assert_eq!(Tier::Standard.max_players_ceiling(), 8);
        assert_eq!(Tier::Premium.max_players_ceiling(), 12);
    }

    #[test]
    fn test_tier_from_str() {
        assert_eq!("free".parse::<Tier>().unwrap(), Tier::Free);
        assert_eq!("Premium".parse::<Tier>().unwrap(), Tier::Premium);
        assert!("gold".parse::<Tier>().is_err());
    }

    #[test]
    fn test_party_policy_by_tier() {
        let free = RoomPolicy::for_party(Tier::Free);
        assert_eq!(free.max_players, 4);
        assert_eq!(free.ttl, Duration::minutes(30));

        let standard = RoomPolicy::for_party(Tier::Standard);
        assert_eq!(standard.max_players, 8);
        assert_eq!(standard.ttl, Duration::hours(2));

        let premium = RoomPolicy::for_party(Tier::Premium);
        assert_eq!(premium.max_players, 12);
        assert_eq!(premium.ttl, Duration::hours(24));
    }

    #[test]
    fn test_script_policy_uses_script_metadata() {
        let script = ScriptDefinition::sample(4, 8, 3);
        let policy = RoomPolicy::for_script(&script);
        assert_eq!(policy.max_players, 8);
        assert_eq!(policy.ttl, Duration::hours(2));
    }

    #[test]
    fn test_room_expiry() {
        let now = Utc::now();
        let mut room = Room {
            id: Uuid::new_v4(),
            slug: "ABC-DEF".into(),
            host_id: None,
            max_players: 4,
            expires_at: now + Duration::minutes(5),
            party_room: true,
            script_room: false,
            anonymous_mode: false,
            script_id: None,
            has_password: false,
            created_at: now,
        };
        assert!(!room.is_expired(now));

        room.expires_at = now;
        assert!(room.is_expired(now));

        room.expires_at = now - Duration::seconds(1);
        assert!(room.is_expired(now));
    }

    #[test]
    fn test_create_room_request_validation() {
        let valid = CreateRoomRequest {
            kind: RoomKind::PartyRoom,
            password: Some("1234".into()),
            max_players: Some(4),
            script_id: None,
            anonymous_mode: false,
            tier: None,
        };
        assert!(valid.validate().is_ok());

        let bad_password = CreateRoomRequest {
            password: Some("12345".into()),
            ..valid.clone()
        };
        assert!(bad_password.validate().is_err());

        let too_big = CreateRoomRequest {
            max_players: Some(20),
            ..valid
        };
        assert!(too_big.validate().is_err());
    }
}
