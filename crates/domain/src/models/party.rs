//! Party-room game state: which mini-game is live, plus a cheer counter.

use serde::{Deserialize, Serialize};

/// Shared state of a party room's screens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PartyRoomState {
    /// The mini-game currently shown on every screen, if any.
    pub current_game_id: Option<String>,
    /// Monotonic cheer counter.
    pub cheers_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        let state = PartyRoomState::default();
        assert!(state.current_game_id.is_none());
        assert_eq!(state.cheers_count, 0);
    }

    #[test]
    fn test_serde_shape() {
        let state = PartyRoomState {
            current_game_id: Some("trivia".into()),
            cheers_count: 3,
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"current_game_id": "trivia", "cheers_count": 3})
        );
    }
}
