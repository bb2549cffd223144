use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use domain::models::ScriptCatalog;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    action_rate_limit, create_room_rate_limit, metrics_handler, metrics_middleware,
    RateLimiterState,
};
use crate::routes::{game_state, health, rooms};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub catalog: Arc<ScriptCatalog>,
    pub create_limiter: Option<Arc<RateLimiterState>>,
    pub action_limiter: Option<Arc<RateLimiterState>>,
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let config = Arc::new(config);

    // Zero disables a quota
    let create_limiter = (config.security.create_room_per_minute > 0)
        .then(|| Arc::new(RateLimiterState::new(config.security.create_room_per_minute)));
    let action_limiter = (config.security.actions_per_minute > 0)
        .then(|| Arc::new(RateLimiterState::new(config.security.actions_per_minute)));

    let state = AppState {
        pool,
        config: config.clone(),
        catalog: Arc::new(ScriptCatalog::builtin()),
        create_limiter,
        action_limiter,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Room creation carries its own, stricter per-address quota
    let create_routes = Router::new()
        .route("/api/v1/rooms", post(rooms::create_room))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            create_room_rate_limit,
        ));

    // Joins and state transitions share the higher action quota
    let action_routes = Router::new()
        .route("/api/v1/rooms/:slug/join", post(rooms::join_room))
        .route("/api/v1/rooms/:slug/leave", post(rooms::leave_room))
        .route("/api/v1/rooms/:slug/end", post(rooms::end_room))
        .route("/api/v1/rooms/:slug/settings", patch(rooms::update_settings))
        .route(
            "/api/v1/rooms/:slug/state/:game_id",
            post(game_state::post_transition),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            action_rate_limit,
        ));

    // Read-only routes every client polls; no quota beyond infrastructure
    let read_routes = Router::new()
        .route("/api/v1/rooms/active", get(rooms::list_active_rooms))
        .route("/api/v1/rooms/:slug", get(rooms::get_room))
        .route(
            "/api/v1/rooms/:slug/state/:game_id",
            get(game_state::get_game_state),
        );

    // Public operational routes
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(read_routes)
        .merge(create_routes)
        .merge(action_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
