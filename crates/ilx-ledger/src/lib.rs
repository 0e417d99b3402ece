//! ILX ledger layer — one participant's connection to one ledger.
//!
//! This crate provides:
//! - [`LedgerEndpoint`] — the capability interface a ledger transport implements.
//! - [`MessageCorrelator`] — matches inbound messages to outstanding requests.
//! - [`QuoteRequester`] — the quote request/response protocol over the correlator.
//! - [`LedgerClient`] — connection lifecycle, single-hop quoting, and payment
//!   submission.
//! - [`testing::MockEndpoint`] — a scriptable in-memory endpoint for tests.

pub mod client;
pub mod config;
pub mod correlator;
pub mod endpoint;
pub mod error;
pub mod events;
pub mod message;
pub mod quoting;
pub mod testing;

// Re-exports for convenience.
pub use client::{ConnectionState, ConnectorQuote, LedgerClient, PaymentParams, QuoteParams};
pub use config::{ClientConfig, PayloadFormat};
pub use correlator::MessageCorrelator;
pub use endpoint::{ConnectOptions, LedgerEndpoint, LedgerInfo};
pub use error::LedgerError;
pub use events::LedgerEvent;
pub use message::{
    ErrorBody, MessageEnvelope, MessageMethod, MessagePayload, QuoteRequestBody, QuoteResponseBody,
};
pub use quoting::QuoteRequester;
