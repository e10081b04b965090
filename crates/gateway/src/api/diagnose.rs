//! Diagnosis submission endpoint.
//!
//! `POST /v1/diagnoses` — classify an uploaded image, persist the diagnosis,
//! seed its transcript with the assistant greeting, and return the verdict.

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use ll_domain::error::Error;

use crate::api::error_response;
use crate::runtime;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnoseRequest {
    /// Full URL of the uploaded image.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Storage path, resolved against the configured bucket base URL when
    /// no full `imageUrl` is given.
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub crop_type: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

pub async fn submit(
    State(state): State<AppState>,
    Json(body): Json<DiagnoseRequest>,
) -> impl IntoResponse {
    let user_id = body.user_id.unwrap_or_default();

    let image_url = match resolve_image_url(&state, body.image_url, body.image_path)
    {
        Ok(url) => url,
        Err(e) => return error_response(&e, "resolve_image").into_response(),
    };

    match runtime::submit_diagnosis(&state, &user_id, image_url, body.crop_type)
        .await
    {
        Ok(diagnosis) => Json(serde_json::json!({
            "diagnosisId": diagnosis.id,
            "disease": diagnosis.disease,
            "confidence": diagnosis.confidence,
            "advice": diagnosis.advice,
        }))
        .into_response(),
        Err(e) => {
            // Submission failures carry a details field for the client.
            let (status, Json(mut body)) = error_response(&e, "submit_diagnosis");
            if status.is_server_error() {
                body["details"] =
                    serde_json::json!("diagnosis could not be completed");
                body["error"] = serde_json::json!(
                    "An internal server error occurred during diagnosis."
                );
            }
            (status, Json(body)).into_response()
        }
    }
}

/// Pick the image URL: an explicit `imageUrl` wins; otherwise `imagePath`
/// is resolved against the configured bucket base.
fn resolve_image_url(
    state: &AppState,
    image_url: Option<String>,
    image_path: Option<String>,
) -> Result<String, Error> {
    if let Some(url) = image_url.filter(|u| !u.trim().is_empty()) {
        return Ok(url);
    }

    let path = image_path
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| {
            Error::Validation("either imageUrl or imagePath is required".into())
        })?;

    let base = state
        .config
        .storage
        .bucket_base_url
        .as_deref()
        .ok_or_else(|| {
            Error::Config(
                "imagePath given but storage.bucket_base_url is not configured"
                    .into(),
            )
        })?;

    Ok(format!(
        "{}/{}?alt=media",
        base.trim_end_matches('/'),
        urlencode(&path)
    ))
}

/// Percent-encode a storage object path for use in a URL path segment.
fn urlencode(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for byte in path.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
