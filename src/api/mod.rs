mod error;
mod handlers;
mod state;

pub use error::ApiError;
pub use handlers::OMITTED_REGIONS_HEADER;
pub use state::AppState;

use crate::config::ServerConfig;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

/// Create the API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/query", post(handlers::handle_query))
        .route("/api/query/multi", post(handlers::handle_multi_query))
        .route("/api/context/{lat}/{lon}", get(handlers::get_context))
        .route("/api/resolve", get(handlers::resolve_locations))
        .with_state(state)
}

/// Router plus tracing, CORS and body-size layers from the server config.
pub fn build_app(state: Arc<AppState>, server: &ServerConfig) -> Router {
    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([OMITTED_REGIONS_HEADER]);

    create_router(state)
        .layer(RequestBodyLimitLayer::new(server.body_limit_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
