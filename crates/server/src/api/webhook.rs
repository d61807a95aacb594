//! Telegram webhook endpoint.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tgcatalog_core::{
    IngestError, IngestOutcome, ItemErrorCode, ItemOutcome, JournalEntry, Update,
};
use tracing::{error, info, warn};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct IgnoredResponse {
    pub ok: bool,
    pub info: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ProcessedResponse {
    pub ok: bool,
    pub added: usize,
    pub processed: Vec<ItemOutcome>,
    #[serde(skip_serializing_if = "is_zero")]
    pub skipped: usize,
}

#[derive(Debug, Serialize)]
pub struct WebhookErrorResponse {
    pub ok: bool,
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed: Option<Vec<ItemOutcome>>,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

fn error_response(
    status: StatusCode,
    error: &'static str,
    details: Option<String>,
    processed: Option<Vec<ItemOutcome>>,
) -> Response {
    (
        status,
        Json(WebhookErrorResponse {
            ok: false,
            error,
            details,
            processed,
        }),
    )
        .into_response()
}

/// Remember the delivery in the debug journal.
fn journal(state: &AppState, body: &[u8], status: StatusCode, outcome: &str, added: Option<usize>) {
    let mut entry = JournalEntry::new(body, status.as_u16(), outcome);
    entry.added = added;
    state.journal().record(entry);
}

/// POST /api/webhook - Ingest one Telegram update
///
/// The body is parsed by hand so malformed JSON gets the webhook's own
/// error shape instead of axum's rejection.
pub async fn receive_update(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Response {
    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, "Rejected webhook body that is not a valid update");
            tgcatalog_core::metrics::UPDATES_TOTAL
                .with_label_values(&["invalid"])
                .inc();
            journal(&state, &body, StatusCode::BAD_REQUEST, "invalid_json", None);
            return error_response(
                StatusCode::BAD_REQUEST,
                "invalid json",
                Some(e.to_string()),
                None,
            );
        }
    };

    match state.processor().handle(&update).await {
        Ok(IngestOutcome::Ignored) => {
            journal(&state, &body, StatusCode::OK, "ignored", None);
            (
                StatusCode::OK,
                Json(IgnoredResponse {
                    ok: true,
                    info: "no message payload",
                }),
            )
                .into_response()
        }
        Ok(IngestOutcome::Processed(report)) => {
            if report.all_failed_with(ItemErrorCode::FileTooLarge) {
                warn!(
                    update_id = update.update_id,
                    "Every attachment exceeded the size cap"
                );
                journal(&state, &body, StatusCode::PAYLOAD_TOO_LARGE, "file_too_large", Some(0));
                return error_response(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "file_too_large",
                    None,
                    Some(report.processed),
                );
            }

            info!(
                update_id = update.update_id,
                added = report.added,
                processed = report.processed.len(),
                succeeded = report.succeeded(),
                skipped = report.skipped,
                "Processed update"
            );
            journal(&state, &body, StatusCode::OK, "processed", Some(report.added));
            (
                StatusCode::OK,
                Json(ProcessedResponse {
                    ok: true,
                    added: report.added,
                    processed: report.processed,
                    skipped: report.skipped,
                }),
            )
                .into_response()
        }
        Err(IngestError::ChatNotAllowed(_)) => {
            journal(&state, &body, StatusCode::FORBIDDEN, "chat_not_allowed", None);
            error_response(StatusCode::FORBIDDEN, "chat not allowed", None, None)
        }
        Err(IngestError::Storage(e)) => {
            error!(update_id = update.update_id, error = %e, "Failed to save catalog");
            journal(&state, &body, StatusCode::INTERNAL_SERVER_ERROR, "github_put_failed", None);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "github_put_failed",
                Some(e.to_string()),
                None,
            )
        }
    }
}
