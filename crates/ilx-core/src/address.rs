use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The segment delimiter in ILX addresses.
pub const DELIMITER: char = '.';

/// A dot-delimited ledger or account address.
///
/// An address ending in the delimiter is a *prefix* and denotes a ledger
/// (e.g. `us.fed.bank1.`); a full address denotes an account on a ledger
/// (e.g. `us.fed.bank1.alice`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Create a new address from a string, validating its shape.
    pub fn new(addr: impl Into<String>) -> Result<Self, CoreError> {
        let addr = addr.into();
        if addr.is_empty() {
            return Err(CoreError::InvalidAddress("address is empty".into()));
        }
        if addr.chars().any(char::is_whitespace) {
            return Err(CoreError::InvalidAddress(format!(
                "address contains whitespace: {:?}",
                addr
            )));
        }
        if addr.starts_with(DELIMITER) {
            return Err(CoreError::InvalidAddress(format!(
                "address starts with the delimiter: {}",
                addr
            )));
        }
        // Only the trailing delimiter of a prefix may leave an empty segment.
        let body = addr.strip_suffix(DELIMITER).unwrap_or(&addr);
        if body.is_empty() || body.split(DELIMITER).any(str::is_empty) {
            return Err(CoreError::InvalidAddress(format!(
                "empty segment in address: {}",
                addr
            )));
        }
        Ok(Self(addr))
    }

    /// The address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this address is a ledger prefix (ends with the delimiter).
    pub fn is_prefix(&self) -> bool {
        self.0.ends_with(DELIMITER)
    }

    /// Whether this address falls within the given ledger prefix.
    pub fn in_prefix(&self, prefix: &Address) -> bool {
        prefix.is_prefix() && self.0.starts_with(&prefix.0)
    }
}

impl TryFrom<String> for Address {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::new(value)
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
