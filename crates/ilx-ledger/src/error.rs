use uuid::Uuid;

use ilx_core::CoreError;

/// Errors surfaced by the ledger client layer.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("validation failed: {0}")]
    ValidationError(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("no response within {timeout_ms} ms for request {id}")]
    ResponseTimeout { id: Uuid, timeout_ms: u64 },

    #[error("remote error {name}: {message}")]
    Remote { name: String, message: String },

    #[error("client is not attempting to connect")]
    NotConnecting,

    #[error("connection state channel closed")]
    StateChannelClosed,

    #[error("response channel dropped for request {0}")]
    ResponseChannelDropped(Uuid),
}
