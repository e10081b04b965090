//! Document stores for the LeafLyzer backend.
//!
//! Three stores over a shared data directory: diagnosis documents
//! (`diagnoses/<id>/diagnosis.json`), append-only per-diagnosis transcripts
//! (`diagnoses/<id>/messages.jsonl`), and the read-only disease advice
//! reference collection (`diseases/<label>.json`).

pub mod advice;
pub mod diagnosis;
pub mod transcript;

pub use advice::AdviceIndex;
pub use diagnosis::{DiagnosisStore, NewDiagnosis};
pub use transcript::TranscriptStore;
