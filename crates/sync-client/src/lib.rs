//! Client-side connection and sync manager.
//!
//! There is no persistent bidirectional connection: clients poll the room
//! and game-state endpoints on a fixed cadence, classify their connectivity
//! from consecutive failures, and reconcile fetched snapshots by version.
//! The store is the single source of truth; the local copy is only a
//! cached last-seen snapshot, never an independently mutated replica.

pub mod backoff;
pub mod connection;
pub mod manager;
pub mod transport;

pub use connection::ConnectionStatus;
pub use manager::{SyncConfig, SyncError, SyncManager};
pub use transport::{HttpTransport, RoomTransport, TransportError};
