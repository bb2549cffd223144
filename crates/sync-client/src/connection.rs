//! Connectivity classification from consecutive poll failures.

use serde::Serialize;

/// Failures before the connection is considered lost.
pub const DISCONNECT_THRESHOLD: u32 = 3;

/// Connectivity as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Last poll succeeded.
    Connected,
    /// One or two consecutive failures; keep showing last-known-good
    /// state.
    Degraded,
    /// Three or more consecutive failures; the UI must show an explicit
    /// error with a manual retry affordance.
    Disconnected,
}

impl ConnectionStatus {
    /// Classify from a consecutive-failure count.
    pub fn classify(consecutive_failures: u32) -> Self {
        match consecutive_failures {
            0 => ConnectionStatus::Connected,
            n if n < DISCONNECT_THRESHOLD => ConnectionStatus::Degraded,
            _ => ConnectionStatus::Disconnected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_bands() {
        assert_eq!(ConnectionStatus::classify(0), ConnectionStatus::Connected);
        assert_eq!(ConnectionStatus::classify(1), ConnectionStatus::Degraded);
        assert_eq!(ConnectionStatus::classify(2), ConnectionStatus::Degraded);
        assert_eq!(
            ConnectionStatus::classify(3),
            ConnectionStatus::Disconnected
        );
        assert_eq!(
            ConnectionStatus::classify(10),
            ConnectionStatus::Disconnected
        );
    }
}
