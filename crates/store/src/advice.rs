//! Disease advice reference collection.
//!
//! `diseases/<label>.json` documents carry a `treatment` field and are
//! curated outside this service; this store only reads them. All documents
//! are loaded once at construction, so lookups are pure and infallible.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use ll_domain::error::{Error, Result};

/// Fallback when no document exists for a disease label.
pub const NO_ADVICE: &str = "No advice found.";

/// Fallback when the document exists but carries no treatment text.
/// Distinct from [`NO_ADVICE`]: the label is known, the curation is not done.
pub const TREATMENT_UNAVAILABLE: &str = "Treatment information not available.";

#[derive(Debug, Deserialize)]
struct DiseaseDoc {
    #[serde(default)]
    treatment: Option<String>,
}

/// In-memory index over the disease reference documents.
pub struct AdviceIndex {
    entries: HashMap<String, Option<String>>,
}

impl AdviceIndex {
    /// Load every `diseases/*.json` document under `data_path`.
    ///
    /// A missing directory is an empty index, not an error; malformed
    /// documents are skipped with a warning.
    pub fn load(data_path: &Path) -> Result<Self> {
        let dir = data_path.join("diseases");
        let mut entries = HashMap::new();

        if !dir.exists() {
            tracing::warn!(
                path = %dir.display(),
                "diseases reference directory missing, advice lookups will all fall back"
            );
            return Ok(Self { entries });
        }

        for item in std::fs::read_dir(&dir).map_err(Error::Io)? {
            let item = item.map_err(Error::Io)?;
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(label) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let raw = std::fs::read_to_string(&path).map_err(Error::Io)?;
            match serde_json::from_str::<DiseaseDoc>(&raw) {
                Ok(doc) => {
                    let treatment =
                        doc.treatment.filter(|t| !t.trim().is_empty());
                    entries.insert(label.to_owned(), treatment);
                }
                Err(e) => {
                    tracing::warn!(
                        label = label,
                        error = %e,
                        "skipping malformed disease document"
                    );
                }
            }
        }

        tracing::info!(diseases = entries.len(), "advice index loaded");
        Ok(Self { entries })
    }

    /// Resolve the advice text for a disease label. Never fails.
    pub fn resolve(&self, disease: &str) -> &str {
        match self.entries.get(disease) {
            Some(Some(treatment)) => treatment,
            Some(None) => TREATMENT_UNAVAILABLE,
            None => NO_ADVICE,
        }
    }
}
