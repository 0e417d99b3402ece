use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::amount;
use crate::curve::LiquidityCurve;

/// The externally visible result of a routed quote: one end-to-end rate with
/// its expiry budget.
///
/// Exactly one of `source_amount`/`destination_amount` was caller input; the
/// other is the computed output. `source_expiry_duration` is always
/// `destination_expiry_duration + min_message_window`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Ledger the payment starts on.
    pub source_ledger: Address,
    /// Ledger of the next connector (first intermediate ledger).
    pub next_ledger: Address,
    /// Ledger of the ultimate destination.
    pub destination_ledger: Address,
    #[serde(with = "amount::amount_string")]
    pub source_amount: BigDecimal,
    #[serde(with = "amount::amount_string")]
    pub destination_amount: BigDecimal,
    /// The connector account to pay on the source ledger.
    pub connector_account: Address,
    /// Minimum time margin (seconds) the whole path needs between proposal
    /// and fulfillment.
    pub min_message_window: f64,
    pub source_expiry_duration: f64,
    pub destination_expiry_duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidity_curve: Option<LiquidityCurve>,
}
