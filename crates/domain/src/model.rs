//! Persisted diagnosis and transcript records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Diagnosis
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One crop-image submission: classifier verdict plus resolved advice.
///
/// Immutable once written — the store assigns `id` and `submitted_at`, and
/// nothing edits a diagnosis document afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnosis {
    pub id: String,
    /// Owning user. Non-owning reference to an external identity.
    pub user_id: String,
    pub image_url: String,
    #[serde(default)]
    pub crop_type: Option<String>,
    /// Disease label from the classifier, e.g. `"rice_brownSpot"`.
    pub disease: String,
    /// Classifier confidence in `[0, 1]`.
    pub confidence: f64,
    /// Treatment advice resolved at creation time.
    pub advice: String,
    pub submitted_at: DateTime<Utc>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Message
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Who produced a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// One line of a diagnosis transcript.
///
/// Messages exist only inside their diagnosis; the log is append-only and
/// totally ordered by `timestamp`, ties broken by insertion order.
/// Timestamps are assigned by the store at persistence time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}
