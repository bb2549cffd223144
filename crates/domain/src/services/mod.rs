//! Business logic services.
//!
//! The state machines are pure functions from `(state, context, action)` to
//! a new state; all persistence happens through the game-state store's
//! conditional write, so a rejected transition never leaves partial state.

pub mod party_engine;
pub mod script_engine;
pub mod vote;

use chrono::{DateTime, Utc};
use rand::Rng;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{GameAction, GamePayload, RosterEntry, ScriptDefinition};

/// Errors produced by the game engines. Pure validation failures; the API
/// layer maps them onto the HTTP error taxonomy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Only the host may perform this action")]
    NotHost,

    #[error("Participant is not in the room roster")]
    NotInRoster,

    #[error("Spectators cannot vote")]
    SpectatorVote,

    #[error("The game has not started")]
    NotStarted,

    #[error("The game has already started")]
    AlreadyStarted,

    #[error("The game has ended")]
    GameEnded,

    #[error("Roster has {actual} players but the script needs {min} to {max}")]
    RosterSize { actual: usize, min: i32, max: i32 },

    #[error("Script does not have a role for every player")]
    NotEnoughRoles,

    #[error("The current chapter's punishment must be resolved first")]
    PendingPunishment,

    #[error("A vote round is still open")]
    PendingVote,

    #[error("The current chapter has no vote")]
    NoVoteNode,

    #[error("The current chapter has no punishment")]
    NoPunishmentNode,

    #[error("Unknown vote option: {0}")]
    UnknownVoteOption(String),

    #[error("Action does not apply to this game")]
    WrongGame,

    #[error("Script metadata is missing")]
    MissingScript,
}

/// Everything an engine needs beside the state itself: who is asking, the
/// current roster, the room host, the script metadata (when relevant), and
/// the caller's clock.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    pub requester: Uuid,
    pub roster: &'a [RosterEntry],
    /// Host recorded on the room row; script sessions snapshot it at start.
    pub room_host: Option<Uuid>,
    pub script: Option<&'a ScriptDefinition>,
    pub now: DateTime<Utc>,
}

/// Dispatches one action against a typed payload, returning the replacement
/// payload. Applied by the caller through the store's compare-and-swap.
pub fn apply_action<R: Rng>(
    payload: &GamePayload,
    action: &GameAction,
    ctx: &ActionContext<'_>,
    rng: &mut R,
) -> Result<GamePayload, EngineError> {
    match (payload, action) {
        (GamePayload::Script(state), GameAction::StartGame { .. }) => {
            let script = ctx.script.ok_or(EngineError::MissingScript)?;
            script_engine::start_game(state, ctx, script, rng).map(GamePayload::Script)
        }
        (GamePayload::Script(state), GameAction::AdvanceChapter) => {
            script_engine::advance_chapter(state, ctx).map(GamePayload::Script)
        }
        (GamePayload::Script(state), GameAction::CastVote { option, timer_seconds }) => {
            script_engine::cast_vote(state, ctx, option, *timer_seconds).map(GamePayload::Script)
        }
        (GamePayload::Script(state), GameAction::ResolvePunishment) => {
            script_engine::resolve_punishment(state, ctx).map(GamePayload::Script)
        }
        (GamePayload::Script(state), GameAction::SetReady { ready }) => {
            script_engine::set_ready(state, ctx, *ready).map(GamePayload::Script)
        }
        (GamePayload::Party(state), GameAction::Cheer) => {
            party_engine::cheer(state, ctx).map(GamePayload::Party)
        }
        (GamePayload::Party(state), GameAction::SetCurrentGame { game }) => {
            party_engine::set_current_game(state, ctx, game.clone()).map(GamePayload::Party)
        }
        _ => Err(EngineError::WrongGame),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PartyRoomState;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn roster_of(n: usize) -> Vec<RosterEntry> {
        (0..n)
            .map(|i| RosterEntry {
                id: Uuid::new_v4(),
                order_index: i as i32,
                is_spectator: false,
            })
            .collect()
    }

    #[test]
    fn test_apply_action_rejects_mismatched_game() {
        let roster = roster_of(2);
        let ctx = ActionContext {
            requester: roster[0].id,
            roster: &roster,
            room_host: Some(roster[0].id),
            script: None,
            now: Utc::now(),
        };
        let mut rng = StdRng::seed_from_u64(7);

        let party = GamePayload::Party(PartyRoomState::default());
        let result = apply_action(&party, &GameAction::AdvanceChapter, &ctx, &mut rng);
        assert_eq!(result.unwrap_err(), EngineError::WrongGame);

        let unknown = GamePayload::Unknown(serde_json::json!({}));
        let result = apply_action(&unknown, &GameAction::Cheer, &ctx, &mut rng);
        assert_eq!(result.unwrap_err(), EngineError::WrongGame);
    }

    #[test]
    fn test_apply_action_start_game_needs_script() {
        let roster = roster_of(4);
        let ctx = ActionContext {
            requester: roster[0].id,
            roster: &roster,
            room_host: Some(roster[0].id),
            script: None,
            now: Utc::now(),
        };
        let mut rng = StdRng::seed_from_u64(7);

        let state = GamePayload::default_for(&crate::models::GameId::ScriptMurder).unwrap();
        let action = GameAction::StartGame {
            script_id: "manor_of_masks".into(),
        };
        let result = apply_action(&state, &action, &ctx, &mut rng);
        assert_eq!(result.unwrap_err(), EngineError::MissingScript);
    }
}
