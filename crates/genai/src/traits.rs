use ll_domain::dialogue::{Completion, DialogueTurn};
use ll_domain::error::Result;

/// A complete, ordered dialogue to send in one stateless generation call.
///
/// The model keeps no conversation state between calls; priming turns and
/// transcript history are assembled by the caller on every turn.
#[derive(Debug, Clone, Default)]
pub struct DialogueRequest {
    /// Ordered turns: priming pair first, then the chronological transcript
    /// ending with the newest user turn.
    pub turns: Vec<DialogueTurn>,
    /// Sampling temperature. `None` lets the model choose.
    pub temperature: Option<f32>,
    /// Maximum tokens in the response. `None` lets the model choose.
    pub max_output_tokens: Option<u32>,
}

/// Trait the generative model adapter implements.
///
/// Implementations translate the dialogue vocabulary to a provider's HTTP
/// API and fold the wire-level finish reason into the closed
/// [`ll_domain::dialogue::CompletionStatus`] variant.
#[async_trait::async_trait]
pub trait DialogueModel: Send + Sync {
    /// Send the dialogue and wait for the full completion.
    async fn complete(&self, req: &DialogueRequest) -> Result<Completion>;

    /// Identifier of the underlying model (e.g. `"gemini-1.5-flash"`).
    fn model_id(&self) -> &str;
}
