use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::{auth_middleware, metrics_middleware};
use super::{catalog, debug, handlers, webhook};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // The webhook and the payload journal are authenticated; the catalog is public.
    let authenticated_routes = Router::new()
        .route("/webhook", post(webhook::receive_update))
        .route("/debug/last", get(debug::last_updates))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/catalog", get(catalog::get_catalog))
        .merge(authenticated_routes)
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
