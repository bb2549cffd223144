//! The script-murder state machine.
//!
//! Each operation is a pure mutator: it validates against the current
//! roster and script metadata, then returns the replacement state. The
//! caller persists the result through the game-state store's conditional
//! write, so concurrent transitions race on the version and exactly one
//! wins.
//!
//! Phase transitions are one-way (Lobby -> Play -> Ended) and `Ended`
//! accepts no further mutation; only the read-only achievement computation
//! remains available.

use chrono::Duration;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ActionContext, EngineError};
use crate::models::participant::RosterEntry;
use crate::models::script::{PlayerStatus, ScriptDefinition, ScriptPhase, ScriptRoomState};

/// Non-spectator roster entries in join order.
fn players_in_order(roster: &[RosterEntry]) -> Vec<&RosterEntry> {
    let mut players: Vec<_> = roster.iter().filter(|e| !e.is_spectator).collect();
    players.sort_by_key(|e| e.order_index);
    players
}

fn find_in_roster(roster: &[RosterEntry], id: Uuid) -> Result<&RosterEntry, EngineError> {
    roster
        .iter()
        .find(|e| e.id == id)
        .ok_or(EngineError::NotInRoster)
}

fn require_host(state: &ScriptRoomState, requester: Uuid) -> Result<(), EngineError> {
    if state.host_id == Some(requester) {
        Ok(())
    } else {
        Err(EngineError::NotHost)
    }
}

/// Starts the script session.
///
/// Host-only. The roster's player count must fall within the script's
/// bounds, and every player receives a distinct role drawn from the
/// script's role list by shuffle-and-zip against join order.
pub fn start_game<R: Rng>(
    state: &ScriptRoomState,
    ctx: &ActionContext<'_>,
    script: &ScriptDefinition,
    rng: &mut R,
) -> Result<ScriptRoomState, EngineError> {
    match state.phase {
        ScriptPhase::Lobby => {}
        ScriptPhase::Play => return Err(EngineError::AlreadyStarted),
        ScriptPhase::Ended => return Err(EngineError::GameEnded),
    }

    if ctx.room_host.is_none() || ctx.room_host != Some(ctx.requester) {
        return Err(EngineError::NotHost);
    }

    let players = players_in_order(ctx.roster);
    let actual = players.len();
    if (actual as i32) < script.min_players || (actual as i32) > script.max_players {
        return Err(EngineError::RosterSize {
            actual,
            min: script.min_players,
            max: script.max_players,
        });
    }
    if script.roles.len() < actual {
        return Err(EngineError::NotEnoughRoles);
    }

    let mut roles = script.roles.clone();
    roles.shuffle(rng);

    let mut next = ScriptRoomState {
        phase: ScriptPhase::Play,
        chapter_index: 0,
        total_chapters: script.total_chapters(),
        script_id: Some(script.id.clone()),
        host_id: ctx.room_host,
        ..ScriptRoomState::default()
    };
    for (player, role) in players.iter().zip(roles) {
        next.assignments.insert(player.id, role);
        next.player_statuses.insert(player.id, PlayerStatus::Waiting);
    }
    next.bookmarked_chapters.insert(0);

    Ok(next)
}

/// Advances to the next chapter, or ends the session at the terminal one.
///
/// Host-only. The current chapter's punishment must be resolved if it has
/// one, and an armed vote timer that is still running blocks the advance
/// until it elapses or every player has voted. Timer expiry is evaluated
/// lazily right here, against the caller's clock; nothing resolves it in
/// the background.
pub fn advance_chapter(
    state: &ScriptRoomState,
    ctx: &ActionContext<'_>,
) -> Result<ScriptRoomState, EngineError> {
    match state.phase {
        ScriptPhase::Play => {}
        ScriptPhase::Lobby => return Err(EngineError::NotStarted),
        ScriptPhase::Ended => return Err(EngineError::GameEnded),
    }
    require_host(state, ctx.requester)?;

    let script = ctx.script.ok_or(EngineError::MissingScript)?;
    if let Some(chapter) = script.chapter(state.chapter_index) {
        if chapter.has_punishment && !state.punishment_done {
            return Err(EngineError::PendingPunishment);
        }
        if chapter.has_vote() {
            let timer_running = state
                .vote_timer_end
                .map_or(false, |end| end > ctx.now);
            let everyone_voted = players_in_order(ctx.roster)
                .iter()
                .all(|p| state.votes.contains_key(&p.id));
            if timer_running && !everyone_voted {
                return Err(EngineError::PendingVote);
            }
        }
    }

    let mut next = state.clone();
    next.chapter_index += 1;
    next.votes.clear();
    next.vote_timer_end = None;
    next.punishment_done = false;
    next.stats.chapters_completed += 1;
    for status in next.player_statuses.values_mut() {
        *status = PlayerStatus::Waiting;
    }

    if next.chapter_index >= next.total_chapters {
        next.chapter_index = next.total_chapters;
        next.phase = ScriptPhase::Ended;
    } else {
        next.bookmarked_chapters.insert(next.chapter_index);
    }

    Ok(next)
}

/// Records one participant's vote for the current chapter.
///
/// Any non-spectator roster member may vote; a second vote from the same
/// participant overwrites the first (last-write-wins within a round). The
/// first vote of a round may arm the round timer.
pub fn cast_vote(
    state: &ScriptRoomState,
    ctx: &ActionContext<'_>,
    option: &str,
    timer_seconds: Option<u32>,
) -> Result<ScriptRoomState, EngineError> {
    match state.phase {
        ScriptPhase::Play => {}
        ScriptPhase::Lobby => return Err(EngineError::NotStarted),
        ScriptPhase::Ended => return Err(EngineError::GameEnded),
    }

    let entry = find_in_roster(ctx.roster, ctx.requester)?;
    if entry.is_spectator {
        return Err(EngineError::SpectatorVote);
    }

    let script = ctx.script.ok_or(EngineError::MissingScript)?;
    let chapter = script
        .chapter(state.chapter_index)
        .ok_or(EngineError::NoVoteNode)?;
    if !chapter.has_vote() {
        return Err(EngineError::NoVoteNode);
    }
    if !chapter.vote_options.iter().any(|o| o == option) {
        return Err(EngineError::UnknownVoteOption(option.to_string()));
    }

    let mut next = state.clone();
    if next.votes.is_empty() {
        next.stats.vote_rounds += 1;
        if let Some(seconds) = timer_seconds {
            next.vote_timer_end = Some(ctx.now + Duration::seconds(i64::from(seconds)));
        }
    }
    next.votes.insert(ctx.requester, option.to_string());

    Ok(next)
}

/// Marks the current chapter's punishment as resolved.
///
/// Host-only and idempotent: repeated calls after the first change nothing.
pub fn resolve_punishment(
    state: &ScriptRoomState,
    ctx: &ActionContext<'_>,
) -> Result<ScriptRoomState, EngineError> {
    match state.phase {
        ScriptPhase::Play => {}
        ScriptPhase::Lobby => return Err(EngineError::NotStarted),
        ScriptPhase::Ended => return Err(EngineError::GameEnded),
    }
    require_host(state, ctx.requester)?;

    let script = ctx.script.ok_or(EngineError::MissingScript)?;
    let chapter = script
        .chapter(state.chapter_index)
        .ok_or(EngineError::NoPunishmentNode)?;
    if !chapter.has_punishment {
        return Err(EngineError::NoPunishmentNode);
    }

    let mut next = state.clone();
    if !next.punishment_done {
        next.punishment_done = true;
        next.stats.punishment_count += 1;
    }

    Ok(next)
}

/// Sets the requester's own readiness flag. Advisory: the host may honor
/// it before advancing, the engine never requires it.
pub fn set_ready(
    state: &ScriptRoomState,
    ctx: &ActionContext<'_>,
    ready: bool,
) -> Result<ScriptRoomState, EngineError> {
    if state.phase == ScriptPhase::Ended {
        return Err(EngineError::GameEnded);
    }
    find_in_roster(ctx.roster, ctx.requester)?;

    let mut next = state.clone();
    let status = if ready {
        PlayerStatus::Ready
    } else {
        PlayerStatus::Waiting
    };
    next.player_statuses.insert(ctx.requester, status);

    Ok(next)
}

/// Achievements derivable from a finished session's stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    /// Played the script to the end.
    ScriptCompleted,
    /// Finished without a single punishment.
    CleanHands,
    /// At least one vote round in every chapter.
    BallotRegular,
}

/// Read-only achievement computation, the only operation still available
/// once the phase is `Ended`.
pub fn compute_achievements(state: &ScriptRoomState) -> Vec<Achievement> {
    if state.phase != ScriptPhase::Ended {
        return Vec::new();
    }

    let mut achievements = vec![Achievement::ScriptCompleted];
    if state.stats.punishment_count == 0 {
        achievements.push(Achievement::CleanHands);
    }
    if state.total_chapters > 0 && state.stats.vote_rounds >= state.total_chapters {
        achievements.push(Achievement::BallotRegular);
    }
    achievements
}
