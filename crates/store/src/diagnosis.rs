//! Diagnosis document store.
//!
//! One JSON document per diagnosis at `diagnoses/<id>/diagnosis.json`.
//! Documents are written once at submission time and never edited; an
//! in-memory write-through cache avoids re-reading from disk on the chat
//! path. Async wrappers use `spawn_blocking` so file I/O never blocks the
//! tokio runtime.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::RwLock;

use ll_domain::error::{Error, Result};
use ll_domain::model::Diagnosis;
use ll_domain::trace::TraceEvent;

/// Fields the caller supplies for a new diagnosis; the store assigns the
/// id and submission timestamp.
#[derive(Debug, Clone)]
pub struct NewDiagnosis {
    pub user_id: String,
    pub image_url: String,
    pub crop_type: Option<String>,
    pub disease: String,
    pub confidence: f64,
    pub advice: String,
}

/// File-backed diagnosis store with a write-through cache.
pub struct DiagnosisStore {
    base_dir: PathBuf,
    cache: RwLock<HashMap<String, Diagnosis>>,
}

impl DiagnosisStore {
    /// Create the store rooted at `data_path/diagnoses`.
    pub fn new(data_path: &Path) -> Result<Self> {
        let base_dir = data_path.join("diagnoses");
        std::fs::create_dir_all(&base_dir).map_err(Error::Io)?;
        Ok(Self {
            base_dir,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Persist a new diagnosis and return the stored record.
    ///
    /// The document is on disk before this returns, so a caller holding the
    /// returned id can always fetch it back.
    pub fn add(&self, new: NewDiagnosis) -> Result<Diagnosis> {
        let diagnosis = Diagnosis {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: new.user_id,
            image_url: new.image_url,
            crop_type: new.crop_type,
            disease: new.disease,
            confidence: new.confidence,
            advice: new.advice,
            submitted_at: Utc::now(),
        };

        self.write_to_disk(&diagnosis)?;
        self.cache
            .write()
            .insert(diagnosis.id.clone(), diagnosis.clone());

        TraceEvent::DiagnosisCreated {
            diagnosis_id: diagnosis.id.clone(),
            user_id: diagnosis.user_id.clone(),
            disease: diagnosis.disease.clone(),
            confidence: diagnosis.confidence,
        }
        .emit();

        Ok(diagnosis)
    }

    /// Persist a new diagnosis (async).
    pub async fn add_async(&self, new: NewDiagnosis) -> Result<Diagnosis> {
        let diagnosis = Diagnosis {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: new.user_id,
            image_url: new.image_url,
            crop_type: new.crop_type,
            disease: new.disease,
            confidence: new.confidence,
            advice: new.advice,
            submitted_at: Utc::now(),
        };

        let path = self.doc_path(&diagnosis.id);
        let doc = diagnosis.clone();
        tokio::task::spawn_blocking(move || write_doc(&path, &doc))
            .await
            .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))??;

        self.cache
            .write()
            .insert(diagnosis.id.clone(), diagnosis.clone());

        TraceEvent::DiagnosisCreated {
            diagnosis_id: diagnosis.id.clone(),
            user_id: diagnosis.user_id.clone(),
            disease: diagnosis.disease.clone(),
            confidence: diagnosis.confidence,
        }
        .emit();

        Ok(diagnosis)
    }

    /// Look up a diagnosis by id. Cache first, then disk.
    pub fn get(&self, id: &str) -> Result<Option<Diagnosis>> {
        {
            let cache = self.cache.read();
            if let Some(d) = cache.get(id) {
                return Ok(Some(d.clone()));
            }
        }

        let path = self.doc_path(id);
        let Some(diagnosis) = read_doc(&path)? else {
            return Ok(None);
        };
        self.cache.write().insert(id.to_owned(), diagnosis.clone());
        Ok(Some(diagnosis))
    }

    /// Look up a diagnosis by id (async).
    pub async fn get_async(&self, id: &str) -> Result<Option<Diagnosis>> {
        {
            let cache = self.cache.read();
            if let Some(d) = cache.get(id) {
                return Ok(Some(d.clone()));
            }
        }

        let path = self.doc_path(id);
        let diagnosis = tokio::task::spawn_blocking(move || read_doc(&path))
            .await
            .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))??;

        if let Some(ref d) = diagnosis {
            self.cache.write().insert(id.to_owned(), d.clone());
        }
        Ok(diagnosis)
    }

    // ── Private helpers ───────────────────────────────────────────────

    fn doc_path(&self, id: &str) -> PathBuf {
        self.base_dir.join(id).join("diagnosis.json")
    }

    fn write_to_disk(&self, diagnosis: &Diagnosis) -> Result<()> {
        write_doc(&self.doc_path(&diagnosis.id), diagnosis)
    }
}

fn write_doc(path: &Path, diagnosis: &Diagnosis) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(Error::Io)?;
    }
    let json = serde_json::to_string_pretty(diagnosis)?;
    std::fs::write(path, json).map_err(Error::Io)?;
    Ok(())
}

fn read_doc(path: &Path) -> Result<Option<Diagnosis>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path).map_err(Error::Io)?;
    let diagnosis = serde_json::from_str(&raw)?;
    Ok(Some(diagnosis))
}
