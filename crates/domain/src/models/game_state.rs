//! Generic versioned game-state container.
//!
//! Every mini-game stores its live state as one document keyed by
//! `(room_id, game_id)`. The version column is the optimistic-concurrency
//! token: writers must present the version they read, and exactly one
//! writer wins per version.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::party::PartyRoomState;
use super::script::ScriptRoomState;

/// Identifier of a mini-game within a room.
///
/// Known ids deserialize into their typed payloads; anything else falls
/// through to the raw-JSON path so future game kinds round-trip untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GameId {
    PartyRoom,
    ScriptMurder,
    Other(String),
}

impl GameId {
    pub fn as_str(&self) -> &str {
        match self {
            GameId::PartyRoom => "party_room",
            GameId::ScriptMurder => "script_murder",
            GameId::Other(s) => s,
        }
    }

    /// Whether this id has a typed payload and a lazy default document.
    pub fn is_known(&self) -> bool {
        !matches!(self, GameId::Other(_))
    }
}

impl FromStr for GameId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "party_room" => GameId::PartyRoom,
            "script_murder" => GameId::ScriptMurder,
            other => GameId::Other(other.to_string()),
        })
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for GameId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for GameId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().expect("GameId::from_str is infallible"))
    }
}

/// Typed view of a game-state payload. One variant per known game kind,
/// with a raw-JSON fallback for unknown ids.
#[derive(Debug, Clone, PartialEq)]
pub enum GamePayload {
    Party(PartyRoomState),
    Script(ScriptRoomState),
    Unknown(serde_json::Value),
}

impl GamePayload {
    /// The empty default document created on first read of a known game id.
    /// Unknown ids have no default; reading them before any write is a
    /// not-found condition.
    pub fn default_for(game_id: &GameId) -> Option<Self> {
        match game_id {
            GameId::PartyRoom => Some(GamePayload::Party(PartyRoomState::default())),
            GameId::ScriptMurder => Some(GamePayload::Script(ScriptRoomState::default())),
            GameId::Other(_) => None,
        }
    }

    /// Decode a stored JSON payload according to its game id.
    pub fn from_value(
        game_id: &GameId,
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match game_id {
            GameId::PartyRoom => GamePayload::Party(serde_json::from_value(value)?),
            GameId::ScriptMurder => GamePayload::Script(serde_json::from_value(value)?),
            GameId::Other(_) => GamePayload::Unknown(value),
        })
    }

    /// Encode for storage.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            GamePayload::Party(state) => serde_json::to_value(state),
            GamePayload::Script(state) => serde_json::to_value(state),
            GamePayload::Unknown(value) => Ok(value.clone()),
        }
    }

    pub fn as_script(&self) -> Option<&ScriptRoomState> {
        match self {
            GamePayload::Script(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_party(&self) -> Option<&PartyRoomState> {
        match self {
            GamePayload::Party(p) => Some(p),
            _ => None,
        }
    }
}

/// A versioned game-state document as read from the store.
#[derive(Debug, Clone)]
pub struct GameStateDocument {
    pub room_id: Uuid,
    pub game_id: GameId,
    pub version: i64,
    pub payload: GamePayload,
}

impl GameStateDocument {
    /// Decode a stored row into its typed form.
    pub fn decode(
        room_id: Uuid,
        game_id: GameId,
        version: i64,
        payload: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        let payload = GamePayload::from_value(&game_id, payload)?;
        Ok(Self {
            room_id,
            game_id,
            version,
            payload,
        })
    }
}

/// One state transition proposed by a client.
///
/// `expected_version` is the version the client read; the write is rejected
/// with a version conflict if the stored version moved on.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TransitionRequest {
    pub participant_id: Uuid,
    pub expected_version: i64,
    pub action: GameAction,
}

/// Game-specific actions applied through the conditional write.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameAction {
    // Script-murder actions
    StartGame {
        script_id: String,
    },
    AdvanceChapter,
    CastVote {
        option: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        timer_seconds: Option<u32>,
    },
    ResolvePunishment,
    SetReady {
        ready: bool,
    },
    // Party-room actions
    Cheer,
    SetCurrentGame {
        game: Option<String>,
    },
}

/// Wire shape of a game-state snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GameStateResponse {
    pub version: i64,
    pub payload: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_id_roundtrip() {
        assert_eq!("party_room".parse::<GameId>().unwrap(), GameId::PartyRoom);
        assert_eq!(
            "script_murder".parse::<GameId>().unwrap(),
            GameId::ScriptMurder
        );
        assert_eq!(
            "trivia_blitz".parse::<GameId>().unwrap(),
            GameId::Other("trivia_blitz".into())
        );
        assert_eq!(GameId::ScriptMurder.to_string(), "script_murder");
    }

    #[test]
    fn test_game_id_known() {
        assert!(GameId::PartyRoom.is_known());
        assert!(GameId::ScriptMurder.is_known());
        assert!(!GameId::Other("x".into()).is_known());
    }

    #[test]
    fn test_default_document_per_game() {
        assert!(matches!(
            GamePayload::default_for(&GameId::PartyRoom),
            Some(GamePayload::Party(_))
        ));
        assert!(matches!(
            GamePayload::default_for(&GameId::ScriptMurder),
            Some(GamePayload::Script(_))
        ));
        assert!(GamePayload::default_for(&GameId::Other("x".into())).is_none());
    }

    #[test]
    fn test_payload_value_roundtrip() {
        let payload = GamePayload::default_for(&GameId::ScriptMurder).unwrap();
        let value = payload.to_value().unwrap();
        let back = GamePayload::from_value(&GameId::ScriptMurder, value).unwrap();
        assert_eq!(payload, back);
    }

    #[test]
    fn test_unknown_payload_roundtrips_untouched() {
        let game_id = GameId::Other("future_game".into());
        let value = serde_json::json!({"arbitrary": ["shape", 1, null]});
        let payload = GamePayload::from_value(&game_id, value.clone()).unwrap();
        assert_eq!(payload.to_value().unwrap(), value);
    }

    #[test]
    fn test_action_wire_format() {
        let action: GameAction =
            serde_json::from_str(r#"{"type":"cast_vote","option":"A","timer_seconds":60}"#)
                .unwrap();
        assert_eq!(
            action,
            GameAction::CastVote {
                option: "A".into(),
                timer_seconds: Some(60),
            }
        );

        let action: GameAction = serde_json::from_str(r#"{"type":"advance_chapter"}"#).unwrap();
        assert_eq!(action, GameAction::AdvanceChapter);

        let action: GameAction = serde_json::from_str(r#"{"type":"cheer"}"#).unwrap();
        assert_eq!(action, GameAction::Cheer);
    }
}
