use std::sync::Arc;

use bigdecimal::{BigDecimal, Zero};
use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use ilx_core::amount::floor_to_scale;
use ilx_core::{Address, Quote};
use ilx_ledger::{ConnectOptions, LedgerClient, LedgerEndpoint, LedgerEvent, QuoteParams};

use crate::config::{CoreConfig, TailQuoteFallback};
use crate::error::RoutingError;
use crate::oracle::{Hop, RouteOracle};

/// An event from one of the registered clients, tagged with the prefix it
/// originated from.
#[derive(Debug, Clone)]
pub struct CoreEvent {
    pub prefix: Address,
    pub event: LedgerEvent,
}

/// Query for [`RoutingCore::quote`].
///
/// Exactly one of `source_amount`/`destination_amount` must be set.
#[derive(Debug, Clone)]
pub struct QuoteQuery {
    pub source_address: Address,
    pub destination_address: Address,
    pub source_amount: Option<BigDecimal>,
    pub destination_amount: Option<BigDecimal>,
    pub source_expiry_duration: Option<f64>,
    pub destination_expiry_duration: Option<f64>,
    pub destination_precision: Option<u32>,
    pub destination_scale: Option<i64>,
}

impl QuoteQuery {
    /// Query with only the endpoints set; everything else starts unset.
    pub fn new(source_address: Address, destination_address: Address) -> Self {
        Self {
            source_address,
            destination_address,
            source_amount: None,
            destination_amount: None,
            source_expiry_duration: None,
            destination_expiry_duration: None,
            destination_precision: None,
            destination_scale: None,
        }
    }
}

struct ClientEntry {
    client: Arc<LedgerClient>,
    relay: JoinHandle<()>,
}

/// Multi-hop orchestration across a registry of ledger clients.
///
/// Owns one [`LedgerClient`] per ledger prefix, consults a [`RouteOracle`]
/// for best-hop selection, and composes local head quotes with remote tail
/// quotes into end-to-end quotes.
pub struct RoutingCore {
    clients: DashMap<String, ClientEntry>,
    oracle: Arc<dyn RouteOracle>,
    config: CoreConfig,
    events: broadcast::Sender<CoreEvent>,
}

impl RoutingCore {
    /// Create a core over the given route oracle.
    pub fn new(oracle: Arc<dyn RouteOracle>, config: CoreConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_channel_capacity);
        Self {
            clients: DashMap::new(),
            oracle,
            config,
            events,
        }
    }

    fn require_prefix(prefix: &Address) -> Result<(), RoutingError> {
        if !prefix.is_prefix() {
            return Err(RoutingError::InvalidPrefix(prefix.to_string()));
        }
        Ok(())
    }

    /// Register a client under a ledger prefix and begin relaying its
    /// events, tagged with that prefix.
    pub fn add_client(
        &self,
        prefix: Address,
        client: Arc<LedgerClient>,
    ) -> Result<(), RoutingError> {
        Self::require_prefix(&prefix)?;

        let relay = {
            let mut rx = client.subscribe();
            let events = self.events.clone();
            let prefix = prefix.clone();
            tokio::spawn(async move {
                loop {
                    match rx.recv().await {
                        Ok(event) => {
                            let _ = events.send(CoreEvent {
                                prefix: prefix.clone(),
                                event,
                            });
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(ledger = %prefix, skipped, "client event relay lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            })
        };

        tracing::info!(ledger = %prefix, "registering ledger client");
        if let Some(old) = self
            .clients
            .insert(prefix.to_string(), ClientEntry { client, relay })
        {
            old.relay.abort();
        }
        Ok(())
    }

    /// Deregister the client under `prefix`, stopping its event relay.
    pub fn remove_client(
        &self,
        prefix: &Address,
    ) -> Result<Option<Arc<LedgerClient>>, RoutingError> {
        Self::require_prefix(prefix)?;
        Ok(self.clients.remove(prefix.as_str()).map(|(_, entry)| {
            entry.relay.abort();
            tracing::info!(ledger = %prefix, "deregistered ledger client");
            entry.client
        }))
    }

    /// Exact-prefix client lookup.
    pub fn get_client(&self, prefix: &Address) -> Result<Option<Arc<LedgerClient>>, RoutingError> {
        Self::require_prefix(prefix)?;
        Ok(self
            .clients
            .get(prefix.as_str())
            .map(|entry| Arc::clone(&entry.client)))
    }

    /// Exact-prefix lookup of the underlying ledger endpoint.
    pub fn get_plugin(
        &self,
        prefix: &Address,
    ) -> Result<Option<Arc<dyn LedgerEndpoint>>, RoutingError> {
        Self::require_prefix(prefix)?;
        Ok(self
            .clients
            .get(prefix.as_str())
            .map(|entry| entry.client.endpoint()))
    }

    /// Prefixes of all registered clients.
    pub fn prefixes(&self) -> Vec<String> {
        let mut prefixes: Vec<String> = self.clients.iter().map(|e| e.key().clone()).collect();
        prefixes.sort();
        prefixes
    }

    /// Number of registered clients.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Subscribe to events from every registered client.
    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.events.subscribe()
    }

    /// Connect all registered clients concurrently.
    pub async fn connect(&self) -> Result<(), RoutingError> {
        let clients: Vec<Arc<LedgerClient>> = self
            .clients
            .iter()
            .map(|entry| Arc::clone(&entry.client))
            .collect();
        let results = join_all(
            clients
                .iter()
                .map(|client| client.connect(ConnectOptions::default())),
        )
        .await;
        for result in results {
            result?;
        }
        Ok(())
    }

    /// Disconnect all registered clients concurrently.
    pub async fn disconnect(&self) -> Result<(), RoutingError> {
        let clients: Vec<Arc<LedgerClient>> = self
            .clients
            .iter()
            .map(|entry| Arc::clone(&entry.client))
            .collect();
        let results = join_all(clients.iter().map(|client| client.disconnect())).await;
        for result in results {
            result?;
        }
        Ok(())
    }

    /// Quote a payment across one or more hops.
    ///
    /// `Ok(None)` means no route or no quote — the caller must check for
    /// absence.
    pub async fn quote(&self, query: QuoteQuery) -> Result<Option<Quote>, RoutingError> {
        let hop = match (&query.source_amount, &query.destination_amount) {
            (Some(amount), None) => self.oracle.find_best_hop_for_source_amount(
                &query.source_address,
                &query.destination_address,
                amount,
            ),
            (None, Some(amount)) => self.oracle.find_best_hop_for_destination_amount(
                &query.source_address,
                &query.destination_address,
                amount,
            ),
            _ => {
                return Err(RoutingError::ValidationError(
                    "provide source or destination amount but not both".into(),
                ))
            }
        };
        let Some(hop) = hop else {
            tracing::debug!(
                source = %query.source_address,
                destination = %query.destination_address,
                "no route found",
            );
            return Ok(None);
        };

        let destination_expiry = query
            .destination_expiry_duration
            .unwrap_or(self.config.default_destination_expiry);

        if hop.reaches(&query.destination_address) {
            return Ok(self.quote_from_hop(&query, &hop, destination_expiry));
        }
        self.quote_with_remote_tail(&query, &hop, destination_expiry)
            .await
    }

    /// Quote built directly from the hop's curve, no remote call.
    fn quote_from_hop(&self, query: &QuoteQuery, hop: &Hop, destination_expiry: f64) -> Option<Quote> {
        let source_amount = hop.source_amount.clone()?;
        let destination_amount = hop
            .final_amount
            .clone()
            .or_else(|| hop.destination_amount.clone())?;
        let destination_amount = match query.destination_scale {
            // A caller-fixed destination amount is exact already.
            Some(scale) if query.destination_amount.is_none() => {
                floor_to_scale(&destination_amount, scale)
            }
            _ => destination_amount,
        };
        let source_expiry = query
            .source_expiry_duration
            .unwrap_or(destination_expiry + hop.min_message_window);
        Some(Quote {
            source_ledger: hop.source_ledger.clone(),
            next_ledger: hop.destination_ledger.clone(),
            destination_ledger: hop.final_ledger.clone(),
            source_amount,
            destination_amount,
            connector_account: hop.connector_address.clone(),
            min_message_window: hop.min_message_window,
            source_expiry_duration: source_expiry,
            destination_expiry_duration: destination_expiry,
            liquidity_curve: hop.liquidity_curve.clone(),
        })
    }

    /// The hop only covers the first segment: ask a connector on the
    /// intermediate ledger to quote the remainder, then compose both legs.
    async fn quote_with_remote_tail(
        &self,
        query: &QuoteQuery,
        hop: &Hop,
        destination_expiry: f64,
    ) -> Result<Option<Quote>, RoutingError> {
        let next_client = self
            .get_client(&hop.destination_ledger)?
            .ok_or_else(|| RoutingError::NoClientForLedger(hop.destination_ledger.to_string()))?;
        let next_scale = next_client.ledger_info().scale;

        // Head-leg delivery onto the intermediate ledger, floored to that
        // ledger's scale.
        let head_destination = match (&query.source_amount, &hop.destination_amount) {
            (Some(_), Some(amount)) => Some(floor_to_scale(amount, next_scale)),
            _ => None,
        };

        let tail = if query.source_amount.is_some() && head_destination.is_none() {
            // The table knows the next ledger but not the head rate; there
            // is nothing to ask the tail with.
            None
        } else {
            let mut tail_params = QuoteParams::new(query.destination_address.clone());
            tail_params.source_amount = head_destination;
            tail_params.destination_amount = if query.source_amount.is_none() {
                query.destination_amount.clone()
            } else {
                None
            };
            tail_params.destination_expiry_duration = Some(destination_expiry);
            tail_params.source_expiry_duration = query
                .source_expiry_duration
                .map(|s| s - hop.min_message_window);
            tail_params.destination_precision = query.destination_precision;
            tail_params.destination_scale = query.destination_scale;
            // The entry connector already absorbed slippage; the tail gets
            // none.
            tail_params.slippage = Some(BigDecimal::zero());
            next_client.quote(tail_params).await?
        };

        let Some(tail) = tail else {
            tracing::debug!(
                intermediate = %hop.destination_ledger,
                destination = %query.destination_address,
                "no tail quote available",
            );
            return match self.config.tail_quote_fallback {
                TailQuoteFallback::LocalQuote => {
                    Ok(self.quote_from_hop(query, hop, destination_expiry))
                }
                TailQuoteFallback::AbsentResult => Ok(None),
            };
        };

        // Recompute the head leg against the tail's answer.
        let (source_amount, destination_amount, head_window) = if query.source_amount.is_some() {
            let Some(source_amount) = hop.source_amount.clone() else {
                return Ok(None);
            };
            (
                source_amount,
                tail.destination_amount.clone(),
                hop.min_message_window,
            )
        } else {
            // The tail says how much must arrive on the intermediate
            // ledger; convert backward through the table, falling back to
            // the head curve when the table cannot serve the query.
            let head = self.oracle.find_best_hop_for_destination_amount(
                &query.source_address,
                &hop.destination_ledger,
                &tail.source_amount,
            );
            let source_amount = head
                .as_ref()
                .and_then(|h| h.source_amount.clone())
                .or_else(|| {
                    hop.liquidity_curve
                        .as_ref()
                        .and_then(|curve| curve.amount_reverse(&tail.source_amount))
                });
            let Some(source_amount) = source_amount else {
                return Ok(None);
            };
            let head_window = head
                .map(|h| h.min_message_window)
                .unwrap_or(hop.min_message_window);
            let destination_amount = query
                .destination_amount
                .clone()
                .unwrap_or_else(|| tail.destination_amount.clone());
            (source_amount, destination_amount, head_window)
        };

        // Total window: both legs, the tail's measured as its own
        // expiry-duration delta.
        let tail_window = match (tail.source_expiry_duration, tail.destination_expiry_duration) {
            (Some(source), Some(destination)) => source - destination,
            _ => 0.0,
        };
        let min_message_window = head_window + tail_window;

        let liquidity_curve = match (&hop.liquidity_curve, &tail.liquidity_curve) {
            (Some(head_curve), Some(tail_curve)) => head_curve.join(tail_curve).ok(),
            _ => None,
        };

        let destination_amount = match query.destination_scale {
            Some(scale) if query.destination_amount.is_none() => {
                floor_to_scale(&destination_amount, scale)
            }
            _ => destination_amount,
        };

        let source_expiry = query
            .source_expiry_duration
            .unwrap_or(destination_expiry + min_message_window);

        Ok(Some(Quote {
            source_ledger: hop.source_ledger.clone(),
            next_ledger: hop.destination_ledger.clone(),
            destination_ledger: hop.final_ledger.clone(),
            source_amount,
            destination_amount,
            connector_account: hop.connector_address.clone(),
            min_message_window,
            source_expiry_duration: source_expiry,
            destination_expiry_duration: destination_expiry,
            liquidity_curve,
        }))
    }
}
