use std::time::Duration;

use ilx_core::Address;

/// How transfer payloads are rendered on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadFormat {
    /// Opaque base64 packet (current wire generation).
    #[default]
    Packet,
    /// Nested structured payload (older ledgers).
    Structured,
}

/// Configuration for a [`crate::client::LedgerClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Connectors to quote against; when empty the set advertised by the
    /// ledger endpoint is used.
    pub connectors: Vec<Address>,
    /// How long to wait for a correlated response to a request message.
    pub message_timeout: Duration,
    /// Wire rendition of transfer payloads.
    pub payload_format: PayloadFormat,
    /// Capacity of the client's event broadcast channel.
    pub event_channel_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connectors: Vec::new(),
            message_timeout: Duration::from_secs(10),
            payload_format: PayloadFormat::default(),
            event_channel_capacity: 256,
        }
    }
}
