//! The sync manager: polling loop, snapshot reconciliation, and bounded
//! transition retries.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use uuid::Uuid;

use domain::models::game_state::{GameAction, GamePayload, GameStateResponse, TransitionRequest};
use domain::models::room::RoomDetail;
use domain::models::{GameId, RosterEntry};
use domain::services::script_engine::{compute_achievements, Achievement};
use domain::services::vote::{self, VoteOutcome};

use crate::backoff::conflict_backoff;
use crate::connection::ConnectionStatus;
use crate::transport::{RoomTransport, TransportError};

/// Tunables for the sync loop.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Fixed polling cadence (seconds-scale by design).
    pub poll_interval: Duration,
    /// Cooldown on the manual retry affordance, so a stuck user cannot
    /// hammer the server.
    pub retry_cooldown: Duration,
    /// Bound on transition attempts per submit, version conflicts
    /// included.
    pub max_transition_attempts: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            retry_cooldown: Duration::from_secs(5),
            max_transition_attempts: 3,
        }
    }
}

/// Errors surfaced to the UI layer.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Manual retry is cooling down for another {remaining:?}")]
    RetryCooldown { remaining: Duration },

    #[error("Retry is only available while disconnected")]
    NotDisconnected,

    #[error("Transition still conflicted after {attempts} attempts")]
    ConflictRetriesExhausted { attempts: u32 },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// What one poll did to the local snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    pub status: ConnectionStatus,
    /// False when the fetched state version was not newer than the cached
    /// one and the snapshot was discarded.
    pub state_updated: bool,
}

/// Client-side view of one room and one game, kept consistent by polling.
pub struct SyncManager<T: RoomTransport> {
    transport: T,
    slug: String,
    game_id: GameId,
    config: SyncConfig,
    consecutive_failures: u32,
    room: Option<RoomDetail>,
    state: Option<GameStateResponse>,
    last_manual_retry: Option<Instant>,
}

impl<T: RoomTransport> SyncManager<T> {
    pub fn new(transport: T, slug: impl Into<String>, game_id: GameId, config: SyncConfig) -> Self {
        Self {
            transport,
            slug: slug.into(),
            game_id,
            config,
            consecutive_failures: 0,
            room: None,
            state: None,
            last_manual_retry: None,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus::classify(self.consecutive_failures)
    }

    /// Last-known-good room snapshot. Kept visible while degraded.
    pub fn room(&self) -> Option<&RoomDetail> {
        self.room.as_ref()
    }

    /// Last-known-good game-state snapshot.
    pub fn state(&self) -> Option<&GameStateResponse> {
        self.state.as_ref()
    }

    pub fn cached_version(&self) -> Option<i64> {
        self.state.as_ref().map(|s| s.version)
    }

    /// One poll: fetch room and game state, then reconcile.
    ///
    /// Snapshots replace the local copy wholesale; a state snapshot whose
    /// version is not newer than the cached one is discarded so unchanged
    /// polls cause no UI churn. Non-transient server answers (e.g. the
    /// room expired) are returned as errors without touching the failure
    /// counter.
    pub async fn poll_once(&mut self) -> Result<PollOutcome, SyncError> {
        let fetched = async {
            let room = self.transport.fetch_room(&self.slug).await?;
            let state = self.transport.fetch_state(&self.slug, &self.game_id).await?;
            Ok::<_, TransportError>((room, state))
        }
        .await;

        match fetched {
            Ok((room, state)) => {
                self.consecutive_failures = 0;
                self.room = Some(room);
                let state_updated = self.reconcile(state);
                Ok(PollOutcome {
                    status: ConnectionStatus::Connected,
                    state_updated,
                })
            }
            Err(e) if e.is_transient() => {
                self.consecutive_failures += 1;
                let status = self.status();
                warn!(
                    slug = %self.slug,
                    failures = self.consecutive_failures,
                    ?status,
                    "Poll failed"
                );
                Ok(PollOutcome {
                    status,
                    state_updated: false,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Polls on the configured cadence until the connection is classified
    /// as lost, then returns. The caller shows the error state and calls
    /// [`retry`](Self::retry); every poll is a full-snapshot read, so
    /// resuming needs no special resync protocol.
    pub async fn run(&mut self) -> Result<(), SyncError> {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        loop {
            ticker.tick().await;
            let outcome = self.poll_once().await?;
            if outcome.status == ConnectionStatus::Disconnected {
                info!(slug = %self.slug, "Polling paused: disconnected");
                return Ok(());
            }
        }
    }

    /// Manual retry after a disconnect, rate-limited by a short cooldown.
    pub async fn retry(&mut self) -> Result<PollOutcome, SyncError> {
        if self.status() != ConnectionStatus::Disconnected {
            return Err(SyncError::NotDisconnected);
        }
        if let Some(last) = self.last_manual_retry {
            let elapsed = last.elapsed();
            if elapsed < self.config.retry_cooldown {
                return Err(SyncError::RetryCooldown {
                    remaining: self.config.retry_cooldown - elapsed,
                });
            }
        }
        self.last_manual_retry = Some(Instant::now());
        self.poll_once().await
    }

    /// Submits a transition optimistically against the cached version,
    /// re-reading and retrying with jittered backoff on version conflicts,
    /// up to the configured bound.
    pub async fn submit(
        &mut self,
        participant_id: Uuid,
        action: GameAction,
    ) -> Result<GameStateResponse, SyncError> {
        // A submit before the first successful poll starts from a fresh read
        if self.state.is_none() {
            let state = self.transport.fetch_state(&self.slug, &self.game_id).await?;
            self.reconcile(state);
        }

        let attempts = self.config.max_transition_attempts;
        for attempt in 0..attempts {
            let expected_version = self.cached_version().unwrap_or(0);
            let request = TransitionRequest {
                participant_id,
                expected_version,
                action: action.clone(),
            };

            match self
                .transport
                .submit_transition(&self.slug, &self.game_id, &request)
                .await
            {
                Ok(state) => {
                    self.reconcile(state.clone());
                    return Ok(state);
                }
                Err(TransportError::Conflict) => {
                    debug!(
                        slug = %self.slug,
                        attempt,
                        expected_version,
                        "Version conflict, re-reading"
                    );
                    let fresh = self.transport.fetch_state(&self.slug, &self.game_id).await?;
                    self.reconcile(fresh);
                    if attempt + 1 < attempts {
                        let delay = conflict_backoff(attempt, &mut rand::thread_rng());
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(SyncError::ConflictRetriesExhausted { attempts })
    }

    /// Read-only achievements from the cached snapshot; non-empty only
    /// once a script session has ended.
    pub fn achievements(&self) -> Vec<Achievement> {
        let Some(state) = &self.state else {
            return Vec::new();
        };
        match GamePayload::from_value(&self.game_id, state.payload.clone()) {
            Ok(GamePayload::Script(script)) => compute_achievements(&script),
            _ => Vec::new(),
        }
    }

    /// Tallies the current vote round from the cached snapshot, the way
    /// every client does on read: the store never pre-aggregates, so the
    /// same snapshot yields the same outcome on every screen.
    pub fn vote_outcome(&self) -> Option<VoteOutcome> {
        let state = self.state.as_ref()?;
        let room = self.room.as_ref()?;
        let payload = GamePayload::from_value(&self.game_id, state.payload.clone()).ok()?;
        let script = payload.as_script()?;
        let roster: Vec<RosterEntry> = room.players.iter().map(RosterEntry::from).collect();
        vote::tally(&script.votes, &roster)
    }

    /// Replace the cached state when the fetched version is newer; discard
    /// otherwise. Returns whether the cache changed.
    fn reconcile(&mut self, fetched: GameStateResponse) -> bool {
        let newer = self
            .cached_version()
            .map_or(true, |cached| fetched.version > cached);
        if newer {
            self.state = Some(fetched);
        }
        newer
    }
}
