//! Entity definitions (database row mappings).

pub mod game_state;
pub mod participant;
pub mod room;

pub use game_state::GameStateEntity;
pub use participant::ParticipantEntity;
pub use room::{RoomEntity, RoomSummaryEntity};
