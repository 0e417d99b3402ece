use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use ilx_core::{Address, Transfer};

use crate::error::LedgerError;
use crate::events::LedgerEvent;
use crate::message::MessageEnvelope;

/// Static facts about a ledger, reported by its endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerInfo {
    /// The ledger's address prefix (always ends with the delimiter).
    pub prefix: Address,
    /// Connector accounts this ledger advertises.
    pub connectors: Vec<Address>,
    /// Total significant digits the ledger supports.
    pub precision: u32,
    /// Decimal places the ledger supports.
    pub scale: i64,
}

/// Options passed to [`LedgerEndpoint::connect`].
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Transport-specific parameters (credentials, endpoints, ...).
    pub params: HashMap<String, String>,
}

/// Capability interface of one ledger connection.
///
/// Each implementation bridges the ILX client to a concrete ledger transport
/// (blockchain node, banking rail, in-memory test ledger, ...). The client
/// core never sees transport details.
#[async_trait]
pub trait LedgerEndpoint: Send + Sync {
    /// Establish the ledger connection. Resolves once connected.
    async fn connect(&self, options: ConnectOptions) -> Result<(), LedgerError>;

    /// Close the ledger connection.
    async fn disconnect(&self) -> Result<(), LedgerError>;

    /// Whether the connection is currently established.
    fn is_connected(&self) -> bool;

    /// This participant's own account address on the ledger.
    fn account(&self) -> Address;

    /// Static ledger facts.
    fn info(&self) -> LedgerInfo;

    /// Submit a (conditional) transfer.
    async fn send_transfer(&self, transfer: Transfer) -> Result<(), LedgerError>;

    /// Send a fire-and-forget message to another account on the ledger.
    async fn send_message(&self, message: MessageEnvelope) -> Result<(), LedgerError>;

    /// Present the fulfillment for a held conditional transfer.
    async fn fulfill_condition(
        &self,
        transfer_id: Uuid,
        fulfillment: String,
    ) -> Result<(), LedgerError>;

    /// Subscribe to the endpoint's event stream.
    fn subscribe(&self) -> broadcast::Receiver<LedgerEvent>;
}
