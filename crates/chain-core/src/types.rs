// chain-core/src/types.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Block height
pub type BlockHeight = u64;

/// Timestamp in Unix epoch milliseconds
pub type Timestamp = i64;

/// Module account name used for minting and module-to-account transfers
pub const MODULE_NAME: &str = "consensus";

/// A denominated token amount in micro units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: u64,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u64) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}
