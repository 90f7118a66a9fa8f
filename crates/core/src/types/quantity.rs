//! Quantity change direction and the owner-side decrement policy.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Which way a quantity control was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityDirection {
    Increase,
    Decrease,
}

impl QuantityDirection {
    /// Wire value posted by the quantity buttons.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Increase => "increase",
            Self::Decrease => "decrease",
        }
    }
}

impl fmt::Display for QuantityDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the owner of the cart does when a line at quantity 1 is decreased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DecrementPolicy {
    /// Leave the line at 1.
    #[default]
    Ignore,
    /// Remove the line from the cart.
    Remove,
}

/// Error parsing a [`DecrementPolicy`] from configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown decrement policy '{0}' (expected 'ignore' or 'remove')")]
pub struct UnknownPolicy(pub String);

impl std::str::FromStr for DecrementPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "remove" => Ok(Self::Remove),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}
