//! ILX routing — multi-hop orchestration for the ILX interledger client.
//!
//! This crate provides:
//! - [`RouteOracle`] — the best-hop search interface over a routing table.
//! - [`PrefixRoutingTable`] — a concurrent prefix-matching oracle implementation.
//! - [`RoutingCore`] — the client registry and multi-hop quote-composition
//!   engine: local head quotes composed with remote tail quotes into
//!   end-to-end quotes.

pub mod config;
pub mod core;
pub mod error;
pub mod oracle;
pub mod table;

// Re-exports for convenience.
pub use config::{CoreConfig, TailQuoteFallback};
pub use core::{CoreEvent, QuoteQuery, RoutingCore};
pub use error::RoutingError;
pub use oracle::{Hop, RouteOracle};
pub use table::{PrefixRoutingTable, TableRoute};
