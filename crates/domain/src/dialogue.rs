//! Dialogue vocabulary spoken to the generative model.
//!
//! The model API is stateless: every call carries the full ordered turn
//! sequence. Roles use the Gemini vocabulary (`user` / `model`), which the
//! context assembler maps transcript senders onto.

use serde::{Deserialize, Serialize};

/// Role of a dialogue turn, in the model's own vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogueRole {
    User,
    Model,
}

impl DialogueRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogueRole::User => "user",
            DialogueRole::Model => "model",
        }
    }
}

/// One ordered turn of the dialogue sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueTurn {
    pub role: DialogueRole,
    pub text: String,
}

impl DialogueTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: DialogueRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: DialogueRole::Model,
            text: text.into(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Completion
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// How a generation call ended.
///
/// A closed variant: adapters translate the wire-level finish reason here,
/// and any unrecognized value becomes `OtherAnomaly` carrying the raw reason
/// string. Callers never branch on raw provider strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason")]
pub enum CompletionStatus {
    NormalStop,
    SafetyBlocked,
    OtherAnomaly(String),
}

impl CompletionStatus {
    /// Map a Gemini-style finish reason onto the closed variant.
    /// A missing reason is an anomaly, not a normal stop.
    pub fn from_finish_reason(reason: Option<&str>) -> Self {
        match reason {
            Some("STOP") => CompletionStatus::NormalStop,
            Some("SAFETY") => CompletionStatus::SafetyBlocked,
            Some(other) => CompletionStatus::OtherAnomaly(other.to_string()),
            None => CompletionStatus::OtherAnomaly("UNKNOWN".to_string()),
        }
    }
}

/// The outcome of one generation call.
#[derive(Debug, Clone)]
pub struct Completion {
    /// Concatenated text of the first candidate. May be empty for blocked
    /// or anomalous completions.
    pub text: String,
    pub status: CompletionStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_reason_stop_maps_to_normal() {
        assert_eq!(
            CompletionStatus::from_finish_reason(Some("STOP")),
            CompletionStatus::NormalStop
        );
    }

    #[test]
    fn finish_reason_safety_maps_to_blocked() {
        assert_eq!(
            CompletionStatus::from_finish_reason(Some("SAFETY")),
            CompletionStatus::SafetyBlocked
        );
    }

    #[test]
    fn unrecognized_finish_reason_is_anomaly() {
        assert_eq!(
            CompletionStatus::from_finish_reason(Some("MAX_TOKENS")),
            CompletionStatus::OtherAnomaly("MAX_TOKENS".into())
        );
        assert_eq!(
            CompletionStatus::from_finish_reason(Some("RECITATION")),
            CompletionStatus::OtherAnomaly("RECITATION".into())
        );
    }

    #[test]
    fn missing_finish_reason_is_anomaly() {
        assert_eq!(
            CompletionStatus::from_finish_reason(None),
            CompletionStatus::OtherAnomaly("UNKNOWN".into())
        );
    }

    #[test]
    fn roles_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&DialogueRole::Model).unwrap(),
            r#""model""#
        );
        assert_eq!(
            serde_json::to_string(&DialogueRole::User).unwrap(),
            r#""user""#
        );
    }
}
