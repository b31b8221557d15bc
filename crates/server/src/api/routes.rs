use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{discovery, handlers, webhook};
use super::middleware::metrics_middleware;
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let mut api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Discovery
        .route("/discover/status", get(discovery::status));

    if state.config().discovery.enabled {
        api_routes = api_routes
            .route("/discover/libraries", get(discovery::libraries))
            .route(
                "/discover/validate-paths",
                get(discovery::validate_sampled).post(discovery::validate_given),
            )
            .route("/discover/suggest-mappings", get(discovery::suggest_mappings));
    }

    let webhook_path = state.config().server.webhook_path.clone();

    Router::new()
        .route(&webhook_path, post(webhook::receive))
        .route("/metrics", get(handlers::metrics))
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
