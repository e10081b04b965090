//! Generative model adapter for the LeafLyzer backend.
//!
//! Translates between the domain dialogue vocabulary and the Gemini
//! `generateContent` wire format, and owns the once-initialized shared
//! model handle the gateway calls through.

pub mod google;
pub mod handle;
pub mod traits;
pub(crate) mod util;

// Re-exports for convenience.
pub use google::GeminiModel;
pub use handle::ModelHandle;
pub use traits::{DialogueModel, DialogueRequest};
