use ilx_core::CoreError;
use ilx_ledger::LedgerError;

/// Errors surfaced by the routing core.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("validation failed: {0}")]
    ValidationError(String),

    #[error("not a ledger prefix: {0}")]
    InvalidPrefix(String),

    #[error("invalid route: {reason}")]
    InvalidRoute { reason: String },

    #[error("no client registered for ledger {0}")]
    NoClientForLedger(String),
}
