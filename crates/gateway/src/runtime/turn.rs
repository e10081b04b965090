//! Turn controller.
//!
//! Drives one diagnosis submission or one chat turn end-to-end: store
//! writes in causal order, context assembly, the generation call, and the
//! safety-fallback branch. Every message the caller sees is persisted
//! before the response goes out, so the stored transcript and the served
//! text never diverge.

use std::time::Instant;

use ll_domain::dialogue::{CompletionStatus, DialogueTurn};
use ll_domain::error::{Error, Result};
use ll_domain::model::{Diagnosis, Sender};
use ll_domain::trace::TraceEvent;
use ll_genai::DialogueRequest;

use crate::runtime::context::build_dialogue;
use crate::state::AppState;

/// Pre-authored reply persisted and served when the model blocks a turn on
/// safety grounds. Deliberately never the model's own (possibly empty)
/// output — a blocked turn is a normal reply, not an error.
pub const SAFETY_REFUSAL: &str = "I cannot provide a response to that specific \
    question due to safety guidelines. Could you please ask something else \
    related to the crop disease?";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Diagnosis submission
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Classify an image, persist the diagnosis, and seed its transcript with
/// the assistant greeting.
///
/// The diagnosis document is written before the greeting, so any caller
/// holding the returned id can fetch at least one message. If the greeting
/// append fails after the diagnosis write, the diagnosis remains on disk;
/// the inconsistency is logged and surfaced, not hidden.
pub async fn submit_diagnosis(
    state: &AppState,
    user_id: &str,
    image_url: String,
    crop_type: Option<String>,
) -> Result<Diagnosis> {
    if user_id.trim().is_empty() {
        return Err(Error::Validation("userId is required".into()));
    }

    let verdict = state
        .classifier
        .classify(&image_url, crop_type.as_deref())
        .await?;

    let advice = state.advice.resolve(&verdict.disease).to_owned();

    let diagnosis = state
        .diagnoses
        .add_async(ll_store::NewDiagnosis {
            user_id: user_id.to_owned(),
            image_url,
            crop_type,
            disease: verdict.disease,
            confidence: verdict.confidence,
            advice,
        })
        .await?;

    let greeting = greeting_text(&diagnosis);
    if let Err(e) = state
        .transcripts
        .append_async(&diagnosis.id, Sender::Assistant, &greeting)
        .await
    {
        tracing::error!(
            diagnosis_id = %diagnosis.id,
            error = %e,
            "diagnosis persisted but greeting append failed"
        );
        return Err(e);
    }

    Ok(diagnosis)
}

/// The deterministic greeting seeding every transcript: disease, confidence
/// rounded to a whole percent, the resolved advice, and an invitation.
fn greeting_text(diagnosis: &Diagnosis) -> String {
    format!(
        "Hi! I've diagnosed your crop with {disease} (Confidence: {percent}%).\n\n\
         Initial suggestion: {advice}\n\n\
         I'm here to help further. Ask me anything about treatment options, \
         symptoms, or prevention!",
        disease = diagnosis.disease,
        percent = (diagnosis.confidence * 100.0).round() as i64,
        advice = diagnosis.advice,
    )
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Chat turn
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Run one chat turn against a diagnosis and return the reply text.
///
/// Validation happens before any mutation; after the user message is
/// appended, any completion with usable text adds an assistant message
/// (the safety fallback substitutes the fixed refusal). Completions with
/// no text leave the transcript with the user message only and surface as
/// errors.
pub async fn chat_turn(
    state: &AppState,
    user_id: &str,
    diagnosis_id: &str,
    user_message: &str,
) -> Result<String> {
    // ── Validation: reject before any mutation ───────────────────────
    if user_id.trim().is_empty() {
        return Err(Error::Validation("userId is required".into()));
    }
    if diagnosis_id.trim().is_empty() {
        return Err(Error::Validation("diagnosisId is required".into()));
    }
    let user_message = user_message.trim();
    if user_message.is_empty() {
        return Err(Error::Validation("userMessage cannot be empty".into()));
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
    if diagnosis.disease.trim().is_empty() {
        return Err(Error::DataIntegrity(format!(
            "diagnosis {diagnosis_id} has no disease label"
        )));
    }

    // ── Persist the user turn ────────────────────────────────────────
    state
        .transcripts
        .append_async(diagnosis_id, Sender::User, user_message)
        .await?;

    // ── Assemble bounded context ─────────────────────────────────────
    // The window read races with concurrent appends to the same diagnosis;
    // append order is the only guarantee (see DESIGN.md).
    let history_limit = state.config.chat.history_limit;
    let recent = state.transcripts.last_n(diagnosis_id, history_limit).await?;
    let mut turns = build_dialogue(
        &state.config.chat.assistant_name,
        &diagnosis,
        &recent,
        history_limit,
    );
    let transcript_turns = turns.len() - 2;
    // The new user turn rides at the end of the dialogue as well; the
    // window above may or may not already contain it under concurrency.
    turns.push(DialogueTurn::user(user_message));

    TraceEvent::DialogueAssembled {
        diagnosis_id: diagnosis_id.to_owned(),
        transcript_turns,
        total_turns: turns.len(),
    }
    .emit();

    // ── Generation call (no lock held across it) ─────────────────────
    let model = state.model.get().await?;
    let request = DialogueRequest {
        turns,
        temperature: Some(state.config.genai.temperature),
        max_output_tokens: Some(state.config.genai.max_output_tokens),
    };

    let started = Instant::now();
    let completion = model.complete(&request).await?;
    TraceEvent::GenerationCompleted {
        diagnosis_id: diagnosis_id.to_owned(),
        model: model.model_id().to_owned(),
        status: format!("{:?}", completion.status),
        duration_ms: started.elapsed().as_millis() as u64,
    }
    .emit();

    // ── Branch on how the generation ended ───────────────────────────
    match completion.status {
        CompletionStatus::NormalStop if !completion.text.trim().is_empty() => {
            state
                .transcripts
                .append_async(diagnosis_id, Sender::Assistant, &completion.text)
                .await?;
            Ok(completion.text)
        }
        CompletionStatus::NormalStop => {
            // Stopped cleanly but produced nothing; persisting an empty
            // assistant message would break the non-empty invariant.
            tracing::warn!(
                diagnosis_id = diagnosis_id,
                "model stopped normally with empty text"
            );
            Err(Error::Anomaly("EMPTY_RESPONSE".into()))
        }
        CompletionStatus::SafetyBlocked => {
            TraceEvent::SafetyFallback {
                diagnosis_id: diagnosis_id.to_owned(),
                user_id: user_id.to_owned(),
            }
            .emit();
            state
                .transcripts
                .append_async(diagnosis_id, Sender::Assistant, SAFETY_REFUSAL)
                .await?;
            Ok(SAFETY_REFUSAL.to_owned())
        }
        CompletionStatus::OtherAnomaly(reason) => {
            if completion.text.trim().is_empty() {
                tracing::warn!(
                    diagnosis_id = diagnosis_id,
                    user_id = user_id,
                    reason = %reason,
                    "generation ended anomalously with no text, no assistant message persisted"
                );
                return Err(Error::Anomaly(reason));
            }
            // Truncated output (e.g. MAX_TOKENS) still answers the question;
            // serve it. Only empty anomalous completions surface as errors.
            tracing::warn!(
                diagnosis_id = diagnosis_id,
                reason = %reason,
                "generation ended anomalously, serving the partial text"
            );
            state
                .transcripts
                .append_async(diagnosis_id, Sender::Assistant, &completion.text)
                .await?;
            Ok(completion.text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn greeting_rounds_confidence_to_whole_percent() {
        let diagnosis = Diagnosis {
            id: "d1".into(),
            user_id: "u1".into(),
            image_url: "https://example.com/leaf.jpg".into(),
            crop_type: None,
            disease: "rice_brownSpot".into(),
            confidence: 0.91,
            advice: "Apply fungicide X weekly".into(),
            submitted_at: Utc::now(),
        };
        let greeting = greeting_text(&diagnosis);
        assert!(greeting.contains("rice_brownSpot"));
        assert!(greeting.contains("91%"));
        assert!(greeting.contains("Apply fungicide X weekly"));
    }

    #[test]
    fn greeting_rounds_half_up() {
        let diagnosis = Diagnosis {
            id: "d1".into(),
            user_id: "u1".into(),
            image_url: "https://example.com/leaf.jpg".into(),
            crop_type: None,
            disease: "wheat_rust".into(),
            confidence: 0.875,
            advice: "Rotate crops".into(),
            submitted_at: Utc::now(),
        };
        assert!(greeting_text(&diagnosis).contains("88%"));
    }
}
