/// Shared error type used across all LeafLyzer crates.
///
/// The first group are infrastructure failures; the second group carries the
/// turn-protocol taxonomy the gateway maps onto HTTP statuses (validation →
/// 400, authorization → 403, not-found → 404, everything else → 500).
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("validation: {0}")]
    Validation(String),

    #[error("access denied: {0}")]
    Authorization(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// A persisted record is missing a field the write path should have set.
    /// Signals a prior write-path bug, never bad user input.
    #[error("data integrity: {0}")]
    DataIntegrity(String),

    /// The generative model ended with a non-stop, non-safety finish reason
    /// and produced no usable text. No assistant message is persisted for
    /// these turns.
    #[error("generation anomaly: finish reason {0}")]
    Anomaly(String),

    #[error("auth: {0}")]
    Auth(String),

    #[error("config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
