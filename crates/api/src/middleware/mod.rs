//! HTTP middleware components.

pub mod logging;
pub mod metrics;
pub mod rate_limit;

pub use metrics::{init_metrics, metrics_handler, metrics_middleware};
pub use rate_limit::{action_rate_limit, create_room_rate_limit, RateLimiterState};
