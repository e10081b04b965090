pub mod chat;
pub mod diagnose;
pub mod transcript;

use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;

use ll_domain::error::Error;

use crate::state::AppState;

/// Build the full API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/diagnoses", post(diagnose::submit))
        .route("/v1/diagnoses/:id/transcript", get(transcript::get_transcript))
        .route("/v1/chat", post(chat::chat_turn))
}

/// Liveness probe.
async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Error mapping
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Map a domain error onto an HTTP status.
///
/// Validation, authorization, and not-found are client errors detected
/// before (or without) any state change; everything else is a server error.
pub(crate) fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::Authorization(_) => StatusCode::FORBIDDEN,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// The message the caller sees.
///
/// Client errors echo their own message. Server errors get a human-readable
/// summary only — provider payloads and I/O details stay in the logs.
pub(crate) fn client_message(err: &Error) -> String {
    match err {
        Error::Validation(_) | Error::Authorization(_) | Error::NotFound(_) => {
            err.to_string()
        }
        Error::Anomaly(reason) => format!(
            "The assistant could not complete a response (finish reason: {reason}). \
             Please try again."
        ),
        Error::DataIntegrity(_) => {
            "Internal error: diagnosis record is incomplete.".into()
        }
        _ => "An internal server error occurred.".into(),
    }
}

/// Standard error response: log the full error, serve the safe summary.
pub(crate) fn error_response(
    err: &Error,
    stage: &str,
) -> (StatusCode, Json<serde_json::Value>) {
    let status = status_for(err);
    if status.is_server_error() {
        tracing::error!(stage = stage, error = %err, "request failed");
    } else {
        tracing::debug!(stage = stage, error = %err, "request rejected");
    }
    (
        status,
        Json(serde_json::json!({ "error": client_message(err) })),
    )
}
