//! Scriptable in-memory ledger endpoint for tests.
//!
//! `MockEndpoint` records outbound traffic and answers quote requests
//! according to per-connector scripts, so client and routing tests can run
//! entire quote flows without a real ledger.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use ilx_core::amount::parse_amount;
use ilx_core::{Address, Transfer};

use crate::endpoint::{ConnectOptions, LedgerEndpoint, LedgerInfo};
use crate::error::LedgerError;
use crate::events::LedgerEvent;
use crate::message::{
    ErrorBody, MessageEnvelope, MessageMethod, MessagePayload, QuoteResponseBody,
};

/// Scripted behavior for quote requests addressed to one connector.
#[derive(Debug, Clone)]
pub enum QuoteBehavior {
    /// Reply with this quote body.
    Respond(QuoteResponseBody),
    /// Reply with an error envelope carrying this remote error name.
    Decline { name: String, message: String },
    /// Never reply; the requester's timeout decides.
    Silent,
}

/// Convenience constructor for scripted quote responses.
pub fn quote_response(source: &str, destination: &str, connector: &str) -> QuoteResponseBody {
    QuoteResponseBody {
        source_amount: parse_amount(source).expect("valid source amount"),
        destination_amount: parse_amount(destination).expect("valid destination amount"),
        source_connector_account: Address::new(connector).expect("valid connector account"),
        source_expiry_duration: None,
        destination_expiry_duration: None,
        liquidity_curve: None,
    }
}

/// In-memory [`LedgerEndpoint`] with scripted quote behavior.
pub struct MockEndpoint {
    info: Mutex<LedgerInfo>,
    account: Address,
    connected: AtomicBool,
    fail_sends: AtomicBool,
    events: broadcast::Sender<LedgerEvent>,
    sent_transfers: Mutex<Vec<Transfer>>,
    sent_messages: Mutex<Vec<MessageEnvelope>>,
    fulfillments: Mutex<Vec<(Uuid, String)>>,
    quote_behaviors: Mutex<HashMap<Address, QuoteBehavior>>,
}

impl MockEndpoint {
    /// A mock ledger with the given prefix and own account.
    pub fn new(prefix: &str, account: &str) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            info: Mutex::new(LedgerInfo {
                prefix: Address::new(prefix).expect("valid prefix"),
                connectors: Vec::new(),
                precision: 19,
                scale: 2,
            }),
            account: Address::new(account).expect("valid account"),
            connected: AtomicBool::new(false),
            fail_sends: AtomicBool::new(false),
            events,
            sent_transfers: Mutex::new(Vec::new()),
            sent_messages: Mutex::new(Vec::new()),
            fulfillments: Mutex::new(Vec::new()),
            quote_behaviors: Mutex::new(HashMap::new()),
        }
    }

    /// Advertise connector accounts via `info()`.
    pub fn with_connectors(self, connectors: &[&str]) -> Self {
        self.info.lock().unwrap().connectors = connectors
            .iter()
            .map(|c| Address::new(*c).expect("valid connector"))
            .collect();
        self
    }

    /// Set the ledger's decimal scale.
    pub fn with_scale(self, scale: i64) -> Self {
        self.info.lock().unwrap().scale = scale;
        self
    }

    /// Script the reply for quote requests sent to `connector`.
    pub fn script_quote(&self, connector: &Address, behavior: QuoteBehavior) {
        self.quote_behaviors
            .lock()
            .unwrap()
            .insert(connector.clone(), behavior);
    }

    /// Make subsequent sends fail with a transport error.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Inject an event as if the ledger emitted it.
    pub fn emit(&self, event: LedgerEvent) {
        let _ = self.events.send(event);
    }

    /// Transfers submitted so far.
    pub fn sent_transfers(&self) -> Vec<Transfer> {
        self.sent_transfers.lock().unwrap().clone()
    }

    /// Messages sent so far.
    pub fn sent_messages(&self) -> Vec<MessageEnvelope> {
        self.sent_messages.lock().unwrap().clone()
    }

    /// Fulfillments presented so far.
    pub fn fulfillments(&self) -> Vec<(Uuid, String)> {
        self.fulfillments.lock().unwrap().clone()
    }

    fn reply(&self, request: &MessageEnvelope, behavior: QuoteBehavior) {
        let data = match behavior {
            QuoteBehavior::Silent => return,
            QuoteBehavior::Respond(body) => MessagePayload {
                id: request.data.id,
                method: MessageMethod::QuoteResponse,
                data: serde_json::to_value(&body).ok(),
            },
            QuoteBehavior::Decline { name, message } => MessagePayload {
                id: request.data.id,
                method: MessageMethod::Error,
                data: serde_json::to_value(&ErrorBody { id: name, message }).ok(),
            },
        };
        let response = MessageEnvelope {
            ledger: request.ledger.clone(),
            from: request.to.clone(),
            to: request.from.clone(),
            data,
        };
        let _ = self.events.send(LedgerEvent::IncomingMessage(response));
    }
}

#[async_trait]
impl LedgerEndpoint for MockEndpoint {
    async fn connect(&self, _options: ConnectOptions) -> Result<(), LedgerError> {
        self.connected.store(true, Ordering::SeqCst);
        let _ = self.events.send(LedgerEvent::Connected);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), LedgerError> {
        self.connected.store(false, Ordering::SeqCst);
        let _ = self.events.send(LedgerEvent::Disconnected);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn account(&self) -> Address {
        self.account.clone()
    }

    fn info(&self) -> LedgerInfo {
        self.info.lock().unwrap().clone()
    }

    async fn send_transfer(&self, transfer: Transfer) -> Result<(), LedgerError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(LedgerError::Transport("mock transfer send failure".into()));
        }
        self.sent_transfers.lock().unwrap().push(transfer);
        Ok(())
    }

    async fn send_message(&self, message: MessageEnvelope) -> Result<(), LedgerError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(LedgerError::Transport("mock message send failure".into()));
        }
        self.sent_messages.lock().unwrap().push(message.clone());

        if message.data.method == MessageMethod::QuoteRequest {
            let behavior = self.quote_behaviors.lock().unwrap().get(&message.to).cloned();
            if let Some(behavior) = behavior {
                self.reply(&message, behavior);
            }
        }
        Ok(())
    }

    async fn fulfill_condition(
        &self,
        transfer_id: Uuid,
        fulfillment: String,
    ) -> Result<(), LedgerError> {
        self.fulfillments.lock().unwrap().push((transfer_id, fulfillment));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }
}
