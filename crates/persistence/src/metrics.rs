//! Database metrics collection.

use metrics::histogram;
use std::time::Instant;

/// Record database query duration.
pub fn record_query_duration(query_name: &str, duration_secs: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query_name.to_string()
    )
    .record(duration_secs);
}

/// Times one database operation and records its duration histogram.
///
/// Usage:
/// ```ignore
/// let timer = QueryTimer::new("find_room_by_slug");
/// let result = sqlx::query_as::<_, RoomEntity>(...).fetch_optional(&pool).await;
/// timer.record();
/// result
/// ```
pub struct QueryTimer {
    query_name: String,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: impl Into<String>) -> Self {
        Self {
            query_name: query_name.into(),
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration to metrics.
    pub fn record(self) {
        let duration = self.start.elapsed().as_secs_f64();
        record_query_duration(&self.query_name, duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_timer_creation() {
        let timer = QueryTimer::new("test_query");
        assert_eq!(timer.query_name, "test_query");
    }
}
