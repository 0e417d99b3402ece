//! ILX core — shared types for the ILX interledger client.
//!
//! This crate provides:
//! - [`Address`] — dot-delimited ledger/account addresses with prefix semantics.
//! - [`amount`] — exact-decimal amount parsing, formatting, and scale flooring.
//! - [`LiquidityCurve`] — piecewise-linear rate curves with composition.
//! - [`Quote`] — the externally visible end-to-end quote.
//! - [`Transfer`] — the ledger-level conditional transfer primitive.

pub mod address;
pub mod amount;
pub mod curve;
pub mod error;
pub mod quote;
pub mod transfer;

// Re-exports for convenience.
pub use address::{Address, DELIMITER};
pub use curve::LiquidityCurve;
pub use error::CoreError;
pub use quote::Quote;
pub use transfer::{IlpPacketData, IlpPayload, Transfer};
