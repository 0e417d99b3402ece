use bigdecimal::BigDecimal;

use ilx_core::{Address, LiquidityCurve};

/// Result of a best-route lookup: the first segment of a path toward the
/// destination, plus whatever the table knows about the rest.
///
/// Hops are computed fresh per quote call and never stored.
#[derive(Debug, Clone)]
pub struct Hop {
    /// Ledger the payment starts on.
    pub source_ledger: Address,
    /// Ledger of the next connector.
    pub destination_ledger: Address,
    /// Ledger of the ultimate destination; differs from `destination_ledger`
    /// when more hops follow.
    pub final_ledger: Address,
    /// The connector account to pay on the source ledger.
    pub connector_address: Address,
    /// Amount entering the hop, when derivable from the query.
    pub source_amount: Option<BigDecimal>,
    /// Amount delivered onto `destination_ledger`, when derivable.
    pub destination_amount: Option<BigDecimal>,
    /// Amount arriving at the final destination, when the table can see the
    /// whole path.
    pub final_amount: Option<BigDecimal>,
    /// Time margin (seconds) this hop needs between proposal and
    /// fulfillment.
    pub min_message_window: f64,
    /// Rate curve of the head leg.
    pub liquidity_curve: Option<LiquidityCurve>,
    /// Whether the route was learned from a locally reachable pair rather
    /// than a remote advertisement.
    pub local: bool,
}

impl Hop {
    /// Whether this hop alone completes the path to `destination`.
    pub fn reaches(&self, destination: &Address) -> bool {
        self.local || destination.in_prefix(&self.destination_ledger)
    }
}

/// Black-box best-hop search over a routing table.
pub trait RouteOracle: Send + Sync {
    /// Best hop from `source` toward `destination` for a fixed amount
    /// entering the path.
    fn find_best_hop_for_source_amount(
        &self,
        source: &Address,
        destination: &Address,
        source_amount: &BigDecimal,
    ) -> Option<Hop>;

    /// Best hop from `source` toward `destination` for a fixed amount to be
    /// delivered at the destination.
    fn find_best_hop_for_destination_amount(
        &self,
        source: &Address,
        destination: &Address,
        destination_amount: &BigDecimal,
    ) -> Option<Hop>;
}
