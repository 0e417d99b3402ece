//! Wire envelopes for ledger messaging.
//!
//! Every message travelling between accounts on a ledger is a
//! [`MessageEnvelope`]; request/response exchanges carry a correlation id in
//! the payload. Amounts are decimal strings on the wire.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ilx_core::amount::{amount_string, opt_amount_string};
use ilx_core::{Address, LiquidityCurve};

/// Method discriminator of a ledger message payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum MessageMethod {
    QuoteRequest,
    QuoteResponse,
    Error,
    /// Anything else: unrelated broadcast traffic, ignored by the correlator.
    Other,
}

impl From<String> for MessageMethod {
    fn from(method: String) -> Self {
        match method.as_str() {
            "quote_request" => Self::QuoteRequest,
            "quote_response" => Self::QuoteResponse,
            "error" => Self::Error,
            _ => Self::Other,
        }
    }
}

/// A ledger message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Prefix of the ledger the message travels on.
    pub ledger: Address,
    pub from: Address,
    pub to: Address,
    pub data: MessagePayload,
}

/// The payload of a ledger message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    /// Correlation id for request/response exchanges.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<Uuid>,
    pub method: MessageMethod,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<serde_json::Value>,
}

/// Body of a `quote_request` message. Unset keys are omitted from the wire
/// entirely — a null field is never emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequestBody {
    pub source_address: Address,
    #[serde(
        with = "opt_amount_string",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub source_amount: Option<BigDecimal>,
    pub destination_address: Address,
    #[serde(
        with = "opt_amount_string",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub destination_amount: Option<BigDecimal>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub destination_expiry_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_expiry_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub destination_precision: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub destination_scale: Option<i64>,
    #[serde(
        with = "opt_amount_string",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub slippage: Option<BigDecimal>,
}

/// Body of a `quote_response` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteResponseBody {
    #[serde(with = "amount_string")]
    pub source_amount: BigDecimal,
    #[serde(with = "amount_string")]
    pub destination_amount: BigDecimal,
    /// The responding connector's account on the requester's ledger.
    pub source_connector_account: Address,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_expiry_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub destination_expiry_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub liquidity_curve: Option<LiquidityCurve>,
}

/// Body of an `error` message.
///
/// `id` is the remote error name (e.g. `AssetsNotTradedError`), not the
/// correlation id — that one lives on the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub id: String,
    pub message: String,
}
