//! HTTP route handlers.

pub mod game_state;
pub mod health;
pub mod rooms;
