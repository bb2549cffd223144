//! Repository implementations for database operations.

pub mod game_state;
pub mod participant;
pub mod room;

pub use game_state::GameStateRepository;
pub use participant::{JoinOutcome, ParticipantRepository};
pub use room::{CreateRoomError, NewRoom, RoomRepository, SLUG_ATTEMPTS};
