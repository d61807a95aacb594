//! Catalog API handlers.

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::state::AppState;

/// GET /api/catalog
///
/// The stored catalog document as-is. When it cannot be read the empty
/// document of the configured layout is returned instead.
pub async fn get_catalog(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(state.catalog().load_raw().await)
}
