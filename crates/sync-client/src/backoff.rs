//! Jittered exponential backoff for transition retries.

use rand::Rng;
use std::time::Duration;

/// Base delay for the first retry.
const BASE_MS: u64 = 100;

/// Upper bound regardless of attempt count.
const CAP_MS: u64 = 2_000;

/// Delay before retry number `attempt` (0-based), with up to 50% random
/// jitter so colliding writers do not retry in lockstep.
pub fn conflict_backoff<R: Rng>(attempt: u32, rng: &mut R) -> Duration {
    let base = BASE_MS.saturating_mul(1u64 << attempt.min(6)).min(CAP_MS);
    let jitter = rng.gen_range(0..=base / 2);
    Duration::from_millis((base + jitter).min(CAP_MS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_backoff_grows_with_attempts() {
        let mut rng = StdRng::seed_from_u64(1);
        // Compare lower bounds, which are deterministic
        let first = conflict_backoff(0, &mut rng);
        assert!(first >= Duration::from_millis(100));
        assert!(first <= Duration::from_millis(150));

        let third = conflict_backoff(2, &mut rng);
        assert!(third >= Duration::from_millis(400));
    }

    #[test]
    fn test_backoff_is_capped() {
        let mut rng = StdRng::seed_from_u64(1);
        for attempt in 0..40 {
            assert!(conflict_backoff(attempt, &mut rng) <= Duration::from_millis(2_000));
        }
    }

    #[test]
    fn test_backoff_jitters() {
        let mut rng = StdRng::seed_from_u64(7);
        let samples: Vec<_> = (0..20).map(|_| conflict_backoff(1, &mut rng)).collect();
        let distinct: std::collections::HashSet<_> = samples.iter().collect();
        assert!(distinct.len() > 1, "jitter should vary the delay");
    }
}
