use std::sync::Arc;

use ll_domain::config::Config;
use ll_genai::ModelHandle;
use ll_store::{AdviceIndex, DiagnosisStore, TranscriptStore};

use crate::runtime::classifier::CropClassifier;

/// Shared application state passed to all API handlers.
///
/// Everything here is effectively immutable after bootstrap; per-diagnosis
/// state lives in the stores, per-turn state travels through function
/// arguments. Requests share nothing else, so handlers are free to run
/// concurrently.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    // ── Stores ────────────────────────────────────────────────────────
    pub diagnoses: Arc<DiagnosisStore>,
    pub transcripts: Arc<TranscriptStore>,
    pub advice: Arc<AdviceIndex>,

    // ── External collaborators ────────────────────────────────────────
    pub classifier: Arc<dyn CropClassifier>,
    /// Lazily-built generative model, shared across turns.
    pub model: Arc<ModelHandle>,
}
