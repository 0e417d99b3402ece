use bigdecimal::BigDecimal;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use ilx_core::{Address, LiquidityCurve};

use crate::error::RoutingError;
use crate::oracle::{Hop, RouteOracle};

/// One learned route: from a source ledger, via a connector, toward every
/// destination under a prefix.
///
/// For a route that terminates on `next_ledger` the curve maps source
/// amounts to final amounts. For a longer path the curve only covers the
/// head leg (source ledger to `next_ledger`); the remainder is quoted
/// remotely at lookup time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRoute {
    /// Prefix of the ledger the route starts on.
    pub source_ledger: Address,
    /// Prefix of the next connector's ledger.
    pub next_ledger: Address,
    /// Prefix under which destinations are reachable through this route.
    pub destination_prefix: Address,
    /// The connector account to pay on the source ledger.
    pub connector_address: Address,
    /// Head-leg rate curve.
    pub liquidity_curve: LiquidityCurve,
    /// Time margin (seconds) the head leg needs.
    pub min_message_window: f64,
    /// Whether the pair is locally reachable rather than advertised.
    pub local: bool,
}

impl TableRoute {
    /// Whether the route alone reaches its destinations (no further hops).
    fn direct(&self) -> bool {
        self.local || self.next_ledger == self.destination_prefix
    }

    /// Validate that all fields are acceptable as a routing-table entry.
    pub fn validate(&self) -> Result<(), RoutingError> {
        for (name, prefix) in [
            ("source_ledger", &self.source_ledger),
            ("next_ledger", &self.next_ledger),
            ("destination_prefix", &self.destination_prefix),
        ] {
            if !prefix.is_prefix() {
                return Err(RoutingError::InvalidRoute {
                    reason: format!("{} is not a ledger prefix: {}", name, prefix),
                });
            }
        }
        if self.min_message_window < 0.0 {
            return Err(RoutingError::InvalidRoute {
                reason: format!(
                    "min_message_window is negative: {}",
                    self.min_message_window
                ),
            });
        }
        Ok(())
    }

    fn hop_for_source(&self, source_amount: &BigDecimal) -> Hop {
        let destination_amount = self.liquidity_curve.amount_at(source_amount);
        Hop {
            source_ledger: self.source_ledger.clone(),
            destination_ledger: self.next_ledger.clone(),
            final_ledger: self.destination_prefix.clone(),
            connector_address: self.connector_address.clone(),
            source_amount: Some(source_amount.clone()),
            destination_amount: Some(destination_amount.clone()),
            final_amount: self.direct().then_some(destination_amount),
            min_message_window: self.min_message_window,
            liquidity_curve: Some(self.liquidity_curve.clone()),
            local: self.local,
        }
    }

    fn hop_for_destination(&self, destination_amount: &BigDecimal) -> Option<Hop> {
        if self.direct() {
            let source_amount = self.liquidity_curve.amount_reverse(destination_amount)?;
            Some(Hop {
                source_ledger: self.source_ledger.clone(),
                destination_ledger: self.next_ledger.clone(),
                final_ledger: self.destination_prefix.clone(),
                connector_address: self.connector_address.clone(),
                source_amount: Some(source_amount),
                destination_amount: Some(destination_amount.clone()),
                final_amount: Some(destination_amount.clone()),
                min_message_window: self.min_message_window,
                liquidity_curve: Some(self.liquidity_curve.clone()),
                local: self.local,
            })
        } else {
            // Amounts on the head leg depend on the remote tail; the caller
            // quotes the remainder and converts backward afterwards.
            Some(Hop {
                source_ledger: self.source_ledger.clone(),
                destination_ledger: self.next_ledger.clone(),
                final_ledger: self.destination_prefix.clone(),
                connector_address: self.connector_address.clone(),
                source_amount: None,
                destination_amount: None,
                final_amount: None,
                min_message_window: self.min_message_window,
                liquidity_curve: Some(self.liquidity_curve.clone()),
                local: self.local,
            })
        }
    }
}

/// Composite key: (source ledger, destination prefix, connector account).
type RouteKey = (String, String, String);

/// A concurrent prefix routing table implementing [`RouteOracle`].
///
/// Multiple routes to the same destination prefix through different
/// connectors can coexist; lookups pick the longest destination-prefix
/// match, then the best amount.
pub struct PrefixRoutingTable {
    routes: DashMap<RouteKey, TableRoute>,
}

impl PrefixRoutingTable {
    /// Create a new, empty routing table.
    pub fn new() -> Self {
        Self {
            routes: DashMap::new(),
        }
    }

    /// Insert or overwrite a route. Returns any previous route for the same
    /// (source, destination, connector) triple.
    pub fn add_route(&self, route: TableRoute) -> Result<Option<TableRoute>, RoutingError> {
        route.validate()?;
        let key = (
            route.source_ledger.to_string(),
            route.destination_prefix.to_string(),
            route.connector_address.to_string(),
        );
        Ok(self.routes.insert(key, route))
    }

    /// Remove a specific route. Returns the removed route if it existed.
    pub fn remove_route(
        &self,
        source_ledger: &Address,
        destination_prefix: &Address,
        connector: &Address,
    ) -> Option<TableRoute> {
        let key = (
            source_ledger.to_string(),
            destination_prefix.to_string(),
            connector.to_string(),
        );
        self.routes.remove(&key).map(|(_k, v)| v)
    }

    /// Number of routes in the table.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if the table has no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn matching(&self, source: &Address, destination: &Address) -> Vec<TableRoute> {
        self.routes
            .iter()
            .filter(|r| {
                source.in_prefix(&r.source_ledger) && destination.in_prefix(&r.destination_prefix)
            })
            .map(|r| r.value().clone())
            .collect()
    }
}

impl Default for PrefixRoutingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteOracle for PrefixRoutingTable {
    fn find_best_hop_for_source_amount(
        &self,
        source: &Address,
        destination: &Address,
        source_amount: &BigDecimal,
    ) -> Option<Hop> {
        let mut best: Option<Hop> = None;
        let mut best_rank: (usize, Option<BigDecimal>) = (0, None);
        for route in self.matching(source, destination) {
            let hop = route.hop_for_source(source_amount);
            let rank = (
                route.destination_prefix.as_str().len(),
                hop.destination_amount.clone(),
            );
            let better = match &best {
                None => true,
                // Longest prefix wins; on a tie the larger delivered amount.
                Some(_) => rank.0 > best_rank.0 || (rank.0 == best_rank.0 && rank.1 > best_rank.1),
            };
            if better {
                best_rank = rank;
                best = Some(hop);
            }
        }
        best
    }

    fn find_best_hop_for_destination_amount(
        &self,
        source: &Address,
        destination: &Address,
        destination_amount: &BigDecimal,
    ) -> Option<Hop> {
        let mut best: Option<Hop> = None;
        let mut best_rank: (usize, bool, Option<BigDecimal>) = (0, false, None);
        for route in self.matching(source, destination) {
            let Some(hop) = route.hop_for_destination(destination_amount) else {
                // The route cannot deliver this much.
                continue;
            };
            let known_source = hop.source_amount.clone();
            let rank = (
                route.destination_prefix.as_str().len(),
                known_source.is_some(),
                known_source,
            );
            let better = match &best {
                None => true,
                Some(_) => {
                    // Longest prefix wins; then a route with a computable
                    // source amount; then the smaller required source.
                    rank.0 > best_rank.0
                        || (rank.0 == best_rank.0 && rank.1 && !best_rank.1)
                        || (rank.0 == best_rank.0
                            && rank.1 == best_rank.1
                            && rank.1
                            && rank.2 < best_rank.2)
                }
            };
            if better {
                best_rank = rank;
                best = Some(hop);
            }
        }
        best
    }
}
