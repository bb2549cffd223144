//! Persistence layer for the Party Room backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations, including the version compare-and-swap
//!   every game-state write goes through

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
