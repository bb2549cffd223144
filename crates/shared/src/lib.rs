//! Shared utilities and common types for the Party Room backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Room slug generation
//! - Room password hashing with Argon2id
//! - Common validation logic
//! - List limit clamping

pub mod limit;
pub mod password;
pub mod slug;
pub mod validation;
