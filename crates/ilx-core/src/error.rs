/// Errors produced by ILX core types.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    ValidationError(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid liquidity curve: {0}")]
    InvalidCurve(String),

    #[error("packet encoding error: {0}")]
    PacketError(String),
}
