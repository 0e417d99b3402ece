//! Decimal amount helpers.
//!
//! Ledger amounts are arbitrary-precision decimals carried as strings on the
//! wire. Arithmetic and comparisons are exact; binary floating point is never
//! used for amounts because ledger values may exceed float precision.

use bigdecimal::{BigDecimal, RoundingMode};

use crate::error::CoreError;

/// Parse a decimal amount string.
pub fn parse_amount(s: &str) -> Result<BigDecimal, CoreError> {
    s.parse::<BigDecimal>()
        .map_err(|e| CoreError::InvalidAmount(format!("{}: {}", s, e)))
}

/// Round an amount toward zero to the given decimal scale.
///
/// Applied whenever an amount crosses a ledger-scale boundary: rounding up
/// could request more than the target ledger can deliver.
pub fn floor_to_scale(amount: &BigDecimal, scale: i64) -> BigDecimal {
    amount.with_scale_round(scale, RoundingMode::Down)
}

/// Serde helper to carry a `BigDecimal` amount as a decimal string.
pub mod amount_string {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(amount: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        BigDecimal::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde helper for optional string-encoded amounts.
pub mod opt_amount_string {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(amount: &Option<BigDecimal>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match amount {
            Some(a) => serializer.serialize_some(&a.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<BigDecimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        s.map(|s| BigDecimal::from_str(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
