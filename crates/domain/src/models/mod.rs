//! Domain models for the Party Room backend.

pub mod game_state;
pub mod participant;
pub mod party;
pub mod room;
pub mod script;

pub use game_state::{GameAction, GameId, GamePayload, GameStateDocument};
pub use participant::{Participant, RosterEntry};
pub use party::PartyRoomState;
pub use room::{Room, RoomKind, RoomPolicy, Tier};
pub use script::{ScriptCatalog, ScriptDefinition, ScriptPhase, ScriptRoomState};
