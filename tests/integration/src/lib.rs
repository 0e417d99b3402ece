//! Shared helpers for ILX integration tests.

use bigdecimal::BigDecimal;

use ilx_core::amount::parse_amount;
use ilx_core::{Address, LiquidityCurve};

/// Install a test subscriber so `RUST_LOG` controls test output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Parse an address, panicking on malformed test input.
pub fn addr(s: &str) -> Address {
    Address::new(s).expect("valid test address")
}

/// Parse a decimal, panicking on malformed test input.
pub fn dec(s: &str) -> BigDecimal {
    parse_amount(s).expect("valid test amount")
}

/// Build a curve from string points, panicking on malformed test input.
pub fn curve(points: &[(&str, &str)]) -> LiquidityCurve {
    LiquidityCurve::new(points.iter().map(|(x, y)| (dec(x), dec(y))).collect())
        .expect("valid test curve")
}
