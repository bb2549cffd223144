//! Party-room transitions: which mini-game is live, plus cheers.

use super::{ActionContext, EngineError};
use crate::models::PartyRoomState;

/// Increments the room's cheer counter. Any roster member may cheer.
pub fn cheer(
    state: &PartyRoomState,
    ctx: &ActionContext<'_>,
) -> Result<PartyRoomState, EngineError> {
    if !ctx.roster.iter().any(|e| e.id == ctx.requester) {
        return Err(EngineError::NotInRoster);
    }

    let mut next = state.clone();
    next.cheers_count += 1;
    Ok(next)
}

/// Switches the mini-game shown on every screen. Host-only; `None` returns
/// the room to the game-picker.
pub fn set_current_game(
    state: &PartyRoomState,
    ctx: &ActionContext<'_>,
    game: Option<String>,
) -> Result<PartyRoomState, EngineError> {
    if ctx.room_host.is_none() || ctx.room_host != Some(ctx.requester) {
        return Err(EngineError::NotHost);
    }

    let mut next = state.clone();
    next.current_game_id = game;
    Ok(next)
}
