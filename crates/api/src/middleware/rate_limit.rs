//! Rate limiting middleware.
//!
//! Room creation is limited per client address to bound abuse of the slug
//! and storage namespace; joins and state transitions share a separate,
//! higher per-address quota.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovRateLimiter,
};
use serde_json::json;
use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
    sync::{Arc, RwLock},
};

use crate::app::AppState;

/// Type alias for the rate limiter held per client address.
type AddressRateLimiter = GovRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limiter state shared across all requests: one limiter per client
/// address, created on first sight.
pub struct RateLimiterState {
    limiters: RwLock<HashMap<IpAddr, Arc<AddressRateLimiter>>>,
    per_minute: u32,
}

impl RateLimiterState {
    /// Create a new rate limiter state with the specified quota per minute.
    pub fn new(per_minute: u32) -> Self {
        Self {
            limiters: RwLock::new(HashMap::new()),
            per_minute,
        }
    }

    fn get_or_create_limiter(&self, addr: IpAddr) -> Arc<AddressRateLimiter> {
        {
            let limiters = self.limiters.read().unwrap();
            if let Some(limiter) = limiters.get(&addr) {
                return limiter.clone();
            }
        }

        let mut limiters = self.limiters.write().unwrap();

        // Another request may have created it between the locks
        if let Some(limiter) = limiters.get(&addr) {
            return limiter.clone();
        }

        let quota = Quota::per_minute(
            NonZeroU32::new(self.per_minute).unwrap_or(NonZeroU32::new(60).unwrap()),
        );
        let limiter = Arc::new(GovRateLimiter::direct(quota));
        limiters.insert(addr, limiter.clone());
        limiter
    }

    /// Check whether a request from the given address is allowed.
    /// Returns `Err(retry_after_secs)` when the quota is exhausted.
    pub fn check(&self, addr: IpAddr) -> Result<(), u64> {
        let limiter = self.get_or_create_limiter(addr);

        match limiter.check() {
            Ok(_) => Ok(()),
            Err(not_until) => {
                let wait_time = not_until.wait_time_from(governor::clock::Clock::now(
                    &governor::clock::DefaultClock::default(),
                ));
                Err(wait_time.as_secs().max(1))
            }
        }
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("per_minute", &self.per_minute)
            .field("active_limiters", &self.limiters.read().unwrap().len())
            .finish()
    }
}

/// Applies the room-creation quota.
pub async fn create_room_rate_limit(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    enforce(state.create_limiter.as_deref(), req, next).await
}

/// Applies the join/state-transition quota.
pub async fn action_rate_limit(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    enforce(state.action_limiter.as_deref(), req, next).await
}

async fn enforce(
    limiter: Option<&RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(limiter) = limiter else {
        return next.run(req).await;
    };

    // Without a connect-info extension (e.g. in-process tests) there is no
    // address to key on; let the request through.
    let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>().copied()
    else {
        return next.run(req).await;
    };

    if let Err(retry_after) = limiter.check(addr.ip()) {
        return rate_limited_response(retry_after);
    }

    next.run(req).await
}

/// Create a rate limited response with proper headers and body.
fn rate_limited_response(retry_after: u64) -> Response {
    let body = json!({
        "error": "rate_limited",
        "message": "Too many requests. Please try again later.",
        "retry_after": retry_after
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response.headers_mut().insert(
        header::RETRY_AFTER,
        retry_after.to_string().parse().unwrap(),
    );

    response
}
