//! Recent webhook deliveries for troubleshooting.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tgcatalog_core::JournalEntry;

use crate::state::AppState;

/// Default number of entries returned
const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct DebugLastParams {
    /// Number of newest entries to return (default 10, capped at the journal capacity)
    pub n: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DebugLastResponse {
    pub capacity: usize,
    pub entries: Vec<JournalEntry>,
}

/// GET /api/debug/last?n=
pub async fn last_updates(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DebugLastParams>,
) -> Json<DebugLastResponse> {
    let journal = state.journal();
    let n = params.n.unwrap_or(DEFAULT_LIMIT).min(journal.capacity());
    Json(DebugLastResponse {
        capacity: journal.capacity(),
        entries: journal.last(n),
    })
}
