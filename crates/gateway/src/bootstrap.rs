//! AppState construction extracted from `main.rs`.

use std::sync::Arc;

use anyhow::Context;

use ll_domain::config::Config;
use ll_genai::ModelHandle;
use ll_store::{AdviceIndex, DiagnosisStore, TranscriptStore};

use crate::runtime::classifier::MockClassifier;
use crate::state::AppState;

/// Initialize every subsystem and return a fully-wired [`AppState`].
///
/// The generative model itself is not built here — its handle initializes
/// lazily on the first chat turn so the server can start without an API key
/// and diagnosis submission keeps working.
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    let data_path = &config.storage.data_path;

    let diagnoses = Arc::new(
        DiagnosisStore::new(data_path).context("initializing diagnosis store")?,
    );
    let transcripts = Arc::new(
        TranscriptStore::new(data_path).context("initializing transcript store")?,
    );
    let advice =
        Arc::new(AdviceIndex::load(data_path).context("loading advice index")?);
    tracing::info!(path = %data_path.display(), "document stores ready");

    let model = Arc::new(ModelHandle::new(config.genai.clone()));

    Ok(AppState {
        config,
        diagnoses,
        transcripts,
        advice,
        classifier: Arc::new(MockClassifier),
        model,
    })
}
