//! Ledger event types.
//!
//! The event set is fixed and enumerated explicitly; relaying layers forward
//! these variants one by one rather than through a catch-all listener.

use ilx_core::Transfer;

use crate::message::MessageEnvelope;

/// Events emitted by a ledger endpoint and re-broadcast by its client.
#[derive(Debug, Clone)]
pub enum LedgerEvent {
    /// The endpoint established its connection.
    Connected,
    /// The endpoint lost or closed its connection.
    Disconnected,
    /// An unconditional transfer arrived for this account.
    IncomingTransfer(Transfer),
    /// An unconditional transfer left this account.
    OutgoingTransfer(Transfer),
    /// A conditional transfer is being held pending fulfillment.
    IncomingPrepare(Transfer),
    OutgoingPrepare(Transfer),
    /// A held transfer executed; the fulfillment preimage is attached.
    IncomingFulfill {
        transfer: Transfer,
        fulfillment: String,
    },
    OutgoingFulfill {
        transfer: Transfer,
        fulfillment: String,
    },
    /// A held transfer expired or was cancelled by the ledger.
    IncomingCancel { transfer: Transfer, reason: String },
    OutgoingCancel { transfer: Transfer, reason: String },
    /// A held transfer was rejected by the receiver.
    IncomingReject { transfer: Transfer, reason: String },
    OutgoingReject { transfer: Transfer, reason: String },
    /// A message arrived for this account.
    IncomingMessage(MessageEnvelope),
}

impl LedgerEvent {
    /// Stable event name, used for logging and relay tagging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected => "connect",
            Self::Disconnected => "disconnect",
            Self::IncomingTransfer(_) => "incoming_transfer",
            Self::OutgoingTransfer(_) => "outgoing_transfer",
            Self::IncomingPrepare(_) => "incoming_prepare",
            Self::OutgoingPrepare(_) => "outgoing_prepare",
            Self::IncomingFulfill { .. } => "incoming_fulfill",
            Self::OutgoingFulfill { .. } => "outgoing_fulfill",
            Self::IncomingCancel { .. } => "incoming_cancel",
            Self::OutgoingCancel { .. } => "outgoing_cancel",
            Self::IncomingReject { .. } => "incoming_reject",
            Self::OutgoingReject { .. } => "outgoing_reject",
            Self::IncomingMessage(_) => "incoming_message",
        }
    }
}
