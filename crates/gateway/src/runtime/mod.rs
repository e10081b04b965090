//! Turn orchestration: classifier seam, context assembly, and the
//! controller that drives one diagnosis submission or chat turn end-to-end.

pub mod classifier;
pub mod context;
pub mod turn;

pub use turn::{chat_turn, submit_diagnosis, SAFETY_REFUSAL};
