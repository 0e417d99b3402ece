use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use ilx_core::{Address, IlpPacketData, IlpPayload, LiquidityCurve, Transfer};

use crate::config::{ClientConfig, PayloadFormat};
use crate::correlator::MessageCorrelator;
use crate::endpoint::{ConnectOptions, LedgerEndpoint, LedgerInfo};
use crate::error::LedgerError;
use crate::events::LedgerEvent;
use crate::message::{QuoteRequestBody, QuoteResponseBody};
use crate::quoting::QuoteRequester;

/// Connection lifecycle of a ledger client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Parameters for [`LedgerClient::quote`].
///
/// Exactly one of `source_amount`/`destination_amount` must be set.
#[derive(Debug, Clone)]
pub struct QuoteParams {
    pub destination_address: Address,
    pub source_amount: Option<BigDecimal>,
    pub destination_amount: Option<BigDecimal>,
    pub destination_expiry_duration: Option<f64>,
    pub source_expiry_duration: Option<f64>,
    pub destination_precision: Option<u32>,
    pub destination_scale: Option<i64>,
    /// Tolerance margin applied by the entry connector.
    pub slippage: Option<BigDecimal>,
    /// Connectors to query, overriding the configured/discovered set.
    pub connectors: Option<Vec<Address>>,
}

impl QuoteParams {
    /// Parameters with only the destination set; everything else starts
    /// unset.
    pub fn new(destination_address: Address) -> Self {
        Self {
            destination_address,
            source_amount: None,
            destination_amount: None,
            destination_expiry_duration: None,
            source_expiry_duration: None,
            destination_precision: None,
            destination_scale: None,
            slippage: None,
            connectors: None,
        }
    }
}

/// The caller-facing result of a single-hop quote.
///
/// Unset keys are omitted from serialized output entirely.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectorQuote {
    #[serde(with = "ilx_core::amount::amount_string")]
    pub source_amount: BigDecimal,
    #[serde(with = "ilx_core::amount::amount_string")]
    pub destination_amount: BigDecimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector_account: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_expiry_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_expiry_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidity_curve: Option<LiquidityCurve>,
}

/// Parameters for [`LedgerClient::send_quoted_payment`].
#[derive(Debug, Clone)]
pub struct PaymentParams {
    pub source_amount: BigDecimal,
    pub destination_amount: BigDecimal,
    pub destination_account: Address,
    /// Connector to pay on the local ledger; absent for same-ledger
    /// payments.
    pub connector_account: Option<Address>,
    /// Opaque memo delivered to the receiver.
    pub destination_memo: Option<serde_json::Value>,
    /// Hash-lock digest making the transfer conditional.
    pub execution_condition: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Explicit opt-in to transfers without an execution condition.
    pub unsafe_optimistic_transport: bool,
    /// Caller-supplied transfer id for idempotent retries.
    pub uuid: Option<Uuid>,
}

/// One participant's connection to one ledger: connection lifecycle,
/// single-hop quoting, and payment submission.
pub struct LedgerClient {
    endpoint: Arc<dyn LedgerEndpoint>,
    requester: QuoteRequester,
    config: ClientConfig,
    state: Arc<watch::Sender<ConnectionState>>,
    events: broadcast::Sender<LedgerEvent>,
    pump: JoinHandle<()>,
}

impl LedgerClient {
    /// Create a client over the given endpoint and start its event pump.
    pub fn new(endpoint: Arc<dyn LedgerEndpoint>, config: ClientConfig) -> Self {
        let correlator = Arc::new(MessageCorrelator::new());
        let requester = QuoteRequester::new(
            Arc::clone(&endpoint),
            Arc::clone(&correlator),
            config.message_timeout,
        );
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let state = Arc::new(state_tx);
        let (events, _) = broadcast::channel(config.event_channel_capacity);

        let pump = tokio::spawn(pump_events(
            endpoint.subscribe(),
            correlator,
            Arc::clone(&state),
            events.clone(),
        ));

        Self {
            endpoint,
            requester,
            config,
            state,
            events,
            pump,
        }
    }

    /// Static facts about this client's ledger.
    pub fn ledger_info(&self) -> LedgerInfo {
        self.endpoint.info()
    }

    /// This participant's account on the ledger.
    pub fn account(&self) -> Address {
        self.endpoint.account()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Subscribe to this client's event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    /// Direct access to the underlying endpoint.
    pub fn endpoint(&self) -> Arc<dyn LedgerEndpoint> {
        Arc::clone(&self.endpoint)
    }

    /// Connect the underlying endpoint. Resolves once the endpoint reports
    /// connected.
    pub async fn connect(&self, options: ConnectOptions) -> Result<(), LedgerError> {
        let _ = self.state.send(ConnectionState::Connecting);
        tracing::info!(ledger = %self.endpoint.info().prefix, "connecting ledger client");
        if let Err(e) = self.endpoint.connect(options).await {
            let _ = self.state.send(ConnectionState::Disconnected);
            return Err(e);
        }
        let _ = self.state.send(ConnectionState::Connected);
        Ok(())
    }

    /// Disconnect the underlying endpoint.
    pub async fn disconnect(&self) -> Result<(), LedgerError> {
        self.endpoint.disconnect().await?;
        let _ = self.state.send(ConnectionState::Disconnected);
        tracing::info!(ledger = %self.endpoint.info().prefix, "ledger client disconnected");
        Ok(())
    }

    /// Wait for an in-progress connection attempt to complete.
    ///
    /// Fails immediately when no attempt is underway — distinct from
    /// "not yet connected".
    pub async fn wait_for_connection(&self) -> Result<(), LedgerError> {
        let mut rx = self.state.subscribe();
        let current = *rx.borrow_and_update();
        match current {
            ConnectionState::Connected => Ok(()),
            ConnectionState::Disconnected => Err(LedgerError::NotConnecting),
            ConnectionState::Connecting => rx
                .wait_for(|s| *s == ConnectionState::Connected)
                .await
                .map(|_| ())
                .map_err(|_| LedgerError::StateChannelClosed),
        }
    }

    /// The connector set this client quotes against: the configured list,
    /// else the connectors the ledger itself advertises.
    pub fn get_connectors(&self) -> Vec<Address> {
        if !self.config.connectors.is_empty() {
            self.config.connectors.clone()
        } else {
            self.endpoint.info().connectors
        }
    }

    /// Quote a payment from this ledger toward the destination address.
    ///
    /// `Ok(None)` means no connector offered a quote — by design this is
    /// indistinguishable from "no connectors responded".
    pub async fn quote(&self, params: QuoteParams) -> Result<Option<ConnectorQuote>, LedgerError> {
        let amount = match (&params.source_amount, &params.destination_amount) {
            (Some(a), None) | (None, Some(a)) => a.clone(),
            _ => {
                return Err(LedgerError::ValidationError(
                    "provide source or destination amount but not both".into(),
                ))
            }
        };

        let info = self.endpoint.info();

        // Same-ledger destination: no conversion, no network call.
        if params.destination_address.in_prefix(&info.prefix) {
            return Ok(Some(ConnectorQuote {
                source_amount: amount.clone(),
                destination_amount: amount,
                connector_account: None,
                source_expiry_duration: params
                    .source_expiry_duration
                    .or(params.destination_expiry_duration),
                destination_expiry_duration: params.destination_expiry_duration,
                liquidity_curve: None,
            }));
        }

        let connectors: Vec<Address> = match &params.connectors {
            Some(list) => list.clone(),
            None => self.get_connectors(),
        };
        if connectors.is_empty() {
            tracing::debug!(ledger = %info.prefix, "no connectors available to quote against");
            return Ok(None);
        }

        let body = QuoteRequestBody {
            source_address: self.endpoint.account(),
            source_amount: params.source_amount.clone(),
            destination_address: params.destination_address.clone(),
            destination_amount: params.destination_amount.clone(),
            destination_expiry_duration: params.destination_expiry_duration,
            source_expiry_duration: params.source_expiry_duration,
            destination_precision: params.destination_precision,
            destination_scale: params.destination_scale,
            slippage: params.slippage.clone(),
        };

        // Fan out to every candidate concurrently; declines drop out.
        let responses = join_all(
            connectors
                .iter()
                .map(|connector| self.requester.request_quote(connector, &body)),
        )
        .await;
        let mut quotes = responses.into_iter().flatten();

        let Some(first) = quotes.next() else {
            return Ok(None);
        };
        let best = quotes.fold(first, cheapest_quote);

        Ok(Some(ConnectorQuote {
            source_amount: best.source_amount,
            destination_amount: best.destination_amount,
            connector_account: Some(best.source_connector_account),
            source_expiry_duration: best.source_expiry_duration,
            destination_expiry_duration: best.destination_expiry_duration,
            liquidity_curve: best.liquidity_curve,
        }))
    }

    /// Construct and submit the transfer for an accepted quote.
    ///
    /// Exactly one transfer is submitted per call. The transfer id is the
    /// caller-supplied `uuid` when present, so callers can retry
    /// idempotently.
    pub async fn send_quoted_payment(&self, params: PaymentParams) -> Result<Uuid, LedgerError> {
        if params.execution_condition.is_none() && !params.unsafe_optimistic_transport {
            return Err(LedgerError::ValidationError(
                "execution condition required unless unsafe optimistic transport is explicitly enabled"
                    .into(),
            ));
        }
        if params.execution_condition.is_some() && params.expires_at.is_none() {
            return Err(LedgerError::ValidationError(
                "expiry required when an execution condition is given".into(),
            ));
        }

        let account = match &params.connector_account {
            Some(connector) => connector.clone(),
            None => {
                // Same-ledger payment: no conversion can happen.
                if params.source_amount != params.destination_amount {
                    return Err(LedgerError::ValidationError(
                        "amounts must be equivalent for local transfers".into(),
                    ));
                }
                params.destination_account.clone()
            }
        };

        let packet = IlpPacketData {
            account: params.destination_account.clone(),
            amount: params.destination_amount.clone(),
            data: params.destination_memo.clone(),
        };
        let ilp = match self.config.payload_format {
            PayloadFormat::Structured => IlpPayload::Structured(packet),
            PayloadFormat::Packet => IlpPayload::Packet(packet.to_packet()?),
        };

        let id = params.uuid.unwrap_or_else(Uuid::now_v7);
        let transfer = Transfer {
            id,
            account,
            amount: params.source_amount.clone(),
            ilp,
            execution_condition: params.execution_condition.clone(),
            expires_at: params.expires_at,
        };

        tracing::debug!(transfer_id = %id, account = %transfer.account, "submitting transfer");
        self.endpoint.send_transfer(transfer).await?;
        Ok(id)
    }

    /// Present the fulfillment for a held conditional transfer.
    pub async fn fulfill_condition(
        &self,
        transfer_id: Uuid,
        fulfillment: String,
    ) -> Result<(), LedgerError> {
        self.endpoint.fulfill_condition(transfer_id, fulfillment).await
    }
}

impl Drop for LedgerClient {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

/// Pairwise cheapest-quote reduction: a strictly smaller source amount wins;
/// on a source tie a strictly larger destination amount wins; otherwise the
/// earlier quote is kept. Exact decimal comparisons throughout.
fn cheapest_quote(best: QuoteResponseBody, candidate: QuoteResponseBody) -> QuoteResponseBody {
    if candidate.source_amount < best.source_amount {
        return candidate;
    }
    if candidate.source_amount == best.source_amount
        && candidate.destination_amount > best.destination_amount
    {
        return candidate;
    }
    best
}

/// Background task: mirror endpoint events into the client's state channel,
/// feed inbound messages to the correlator, and re-broadcast everything to
/// the client's subscribers.
async fn pump_events(
    mut rx: broadcast::Receiver<LedgerEvent>,
    correlator: Arc<MessageCorrelator>,
    state: Arc<watch::Sender<ConnectionState>>,
    events: broadcast::Sender<LedgerEvent>,
) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                match &event {
                    LedgerEvent::Connected => {
                        let _ = state.send(ConnectionState::Connected);
                    }
                    LedgerEvent::Disconnected => {
                        let _ = state.send(ConnectionState::Disconnected);
                    }
                    LedgerEvent::IncomingMessage(envelope) => correlator.on_incoming(envelope),
                    _ => {}
                }
                let _ = events.send(event);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "ledger event stream lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
