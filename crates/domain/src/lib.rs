//! Shared domain types for the LeafLyzer backend.
//!
//! Everything the other crates agree on lives here: the error taxonomy,
//! configuration structs, the persisted diagnosis/message model, and the
//! dialogue vocabulary spoken to the generative model.

pub mod config;
pub mod dialogue;
pub mod error;
pub mod model;
pub mod trace;

pub use dialogue::{Completion, CompletionStatus, DialogueRole, DialogueTurn};
pub use error::{Error, Result};
pub use model::{Diagnosis, Message, Sender};
