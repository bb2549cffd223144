//! Domain layer for the Party Room backend.
//!
//! This crate contains:
//! - Domain models (Room, Participant, GameStateDocument)
//! - The script-murder and party-room state machines
//! - Domain error types

pub mod models;
pub mod services;
