use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A numeric field as collectors deliver it. Etherscan sends decimal strings,
/// cleaned exports carry JSON integers, and amounts above `u64::MAX` arrive as floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Int(u64),
    Float(f64),
    Text(String),
}

impl fmt::Display for RawNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl From<u64> for RawNumber {
    fn from(n: u64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for RawNumber {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// One transaction record exactly as an Etherscan-style collector wrote it.
/// Unknown fields (blockNumber, nonce, input, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    #[serde(default)]
    pub hash: String,
    pub from: String,
    /// Empty for contract creations.
    #[serde(default)]
    pub to: Option<String>,
    pub value: RawNumber,
    pub gas_price: RawNumber,
    pub gas_used: RawNumber,
    pub time_stamp: RawNumber,
}

/// A normalized transaction, ready for windowing.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub hash: String,
    pub from: Address,
    pub to: Option<Address>,
    pub value_eth: f64,
    /// gasPrice * gasUsed in ETH. Only meaningful to the sender.
    pub gas_fee_eth: f64,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn is_incoming(&self, target: &Address) -> bool {
        self.to.as_ref() == Some(target)
    }

    pub fn is_outgoing(&self, target: &Address) -> bool {
        &self.from == target
    }

    /// True when the target is the sender, the recipient, or both.
    pub fn involves(&self, target: &Address) -> bool {
        self.is_incoming(target) || self.is_outgoing(target)
    }
}
