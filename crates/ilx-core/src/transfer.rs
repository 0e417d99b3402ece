use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::Address;
use crate::amount;
use crate::error::CoreError;

/// The interledger payload carried inside a transfer: who to pay on the
/// destination ledger, how much, and an optional memo for the receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlpPacketData {
    pub account: Address,
    #[serde(with = "amount::amount_string")]
    pub amount: BigDecimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl IlpPacketData {
    /// Serialize to the opaque base64 wire rendition.
    pub fn to_packet(&self) -> Result<String, CoreError> {
        let json =
            serde_json::to_vec(self).map_err(|e| CoreError::PacketError(e.to_string()))?;
        Ok(BASE64.encode(json))
    }

    /// Parse the opaque base64 wire rendition.
    pub fn from_packet(packet: &str) -> Result<Self, CoreError> {
        let bytes = BASE64
            .decode(packet)
            .map_err(|e| CoreError::PacketError(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| CoreError::PacketError(e.to_string()))
    }
}

/// Wire rendition of the ILP payload. Which one a transfer carries depends on
/// the wire-format generation the ledger speaks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IlpPayload {
    /// Nested structured payload.
    Structured(IlpPacketData),
    /// Opaque serialized packet (base64 of the JSON packet).
    Packet(String),
}

/// A ledger-level conditional transfer.
///
/// If `execution_condition` is set, `expires_at` must also be set; if neither
/// is set the sender explicitly opted into optimistic transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: Uuid,
    /// The immediate counterparty account on the local ledger.
    pub account: Address,
    #[serde(with = "amount::amount_string")]
    pub amount: BigDecimal,
    pub ilp: IlpPayload,
    /// Hash-lock digest; the transfer only executes once the matching
    /// fulfillment is presented before expiry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}
