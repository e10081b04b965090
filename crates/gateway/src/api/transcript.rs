//! Transcript read endpoint.
//!
//! `GET /v1/diagnoses/:id/transcript?userId=...` — the ordered message log
//! for one diagnosis, gated by the same ownership rule as chat.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use ll_domain::error::Error;

use crate::api::error_response;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

pub async fn get_transcript(
    State(state): State<AppState>,
    Path(diagnosis_id): Path<String>,
    Query(query): Query<TranscriptQuery>,
) -> impl IntoResponse {
    match load_transcript(&state, &diagnosis_id, query.user_id.as_deref()).await {
        Ok(messages) => {
            Json(serde_json::json!({ "messages": messages })).into_response()
        }
        Err(e) => error_response(&e, "get_transcript").into_response(),
    }
}

async fn load_transcript(
    state: &AppState,
    diagnosis_id: &str,
    user_id: Option<&str>,
) -> Result<Vec<ll_domain::model::Message>, Error> {
    let user_id = user_id.unwrap_or_default();
    if user_id.trim().is_empty() {
        return Err(Error::Validation("userId is required".into()));
    }

    let diagnosis = state
        .diagnoses
        .get_async(diagnosis_id)
        .await?
        .ok_or_else(|| {
            Error::NotFound(format!("diagnosis {diagnosis_id} not found"))
        })?;

    if diagnosis.user_id != user_id {
        return Err(Error::Authorization(
            "this diagnosis belongs to a different user".into(),
        ));
    }

    state.transcripts.read_async(diagnosis_id).await
}
