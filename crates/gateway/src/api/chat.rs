//! Chat endpoint — one turn of the diagnosis conversation.
//!
//! `POST /v1/chat` — append the user message, run the model with bounded
//! context, persist the assistant reply (or the safety refusal), return it.

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use crate::api::error_response;
use crate::runtime;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurnRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub diagnosis_id: Option<String>,
    #[serde(default)]
    pub user_message: Option<String>,
}

pub async fn chat_turn(
    State(state): State<AppState>,
    Json(body): Json<ChatTurnRequest>,
) -> impl IntoResponse {
    // Missing fields fall through as empty strings so the controller's
    // validation produces the 400, keeping one rejection path.
    let user_id = body.user_id.unwrap_or_default();
    let diagnosis_id = body.diagnosis_id.unwrap_or_default();
    let user_message = body.user_message.unwrap_or_default();

    match runtime::chat_turn(&state, &user_id, &diagnosis_id, &user_message).await
    {
        Ok(reply) => Json(serde_json::json!({ "reply": reply })).into_response(),
        Err(e) => error_response(&e, "chat_turn").into_response(),
    }
}
