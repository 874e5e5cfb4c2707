use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every feature computed for a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    TotalTransactionsInWindow,
    IncomingTxCount,
    OutgoingTxCount,
    TotalEthVolumeIn,
    TotalEthVolumeOut,
    AvgEthTxValueIn,
    AvgEthTxValueOut,
    MaxEthTxValueIn,
    MaxEthTxValueOut,
    UniqueCounterpartiesIn,
    UniqueCounterpartiesOut,
    TotalGasFeeEthSpentByAddress,
    AvgGasFeeEthSpentByAddress,
    AvgTimeBetweenTxSec,
    StdTimeBetweenTxSec,
    IncomingToOutgoingVolumeRatio,
    IncomingToOutgoingCountRatio,
}

impl Feature {
    pub const ALL: [Feature; 17] = [
        Self::TotalTransactionsInWindow,
        Self::IncomingTxCount,
        Self::OutgoingTxCount,
        Self::TotalEthVolumeIn,
        Self::TotalEthVolumeOut,
        Self::AvgEthTxValueIn,
        Self::AvgEthTxValueOut,
        Self::MaxEthTxValueIn,
        Self::MaxEthTxValueOut,
        Self::UniqueCounterpartiesIn,
        Self::UniqueCounterpartiesOut,
        Self::TotalGasFeeEthSpentByAddress,
        Self::AvgGasFeeEthSpentByAddress,
        Self::AvgTimeBetweenTxSec,
        Self::StdTimeBetweenTxSec,
        Self::IncomingToOutgoingVolumeRatio,
        Self::IncomingToOutgoingCountRatio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TotalTransactionsInWindow => "total_transactions_in_window",
            Self::IncomingTxCount => "incoming_tx_count",
            Self::OutgoingTxCount => "outgoing_tx_count",
            Self::TotalEthVolumeIn => "total_eth_volume_in",
            Self::TotalEthVolumeOut => "total_eth_volume_out",
            Self::AvgEthTxValueIn => "avg_eth_tx_value_in",
            Self::AvgEthTxValueOut => "avg_eth_tx_value_out",
            Self::MaxEthTxValueIn => "max_eth_tx_value_in",
            Self::MaxEthTxValueOut => "max_eth_tx_value_out",
            Self::UniqueCounterpartiesIn => "unique_counterparties_in",
            Self::UniqueCounterpartiesOut => "unique_counterparties_out",
            Self::TotalGasFeeEthSpentByAddress => "total_gas_fee_eth_spent_by_address",
            Self::AvgGasFeeEthSpentByAddress => "avg_gas_fee_eth_spent_by_address",
            Self::AvgTimeBetweenTxSec => "avg_time_between_tx_sec",
            Self::StdTimeBetweenTxSec => "std_time_between_tx_sec",
            Self::IncomingToOutgoingVolumeRatio => "incoming_to_outgoing_volume_ratio",
            Self::IncomingToOutgoingCountRatio => "incoming_to_outgoing_count_ratio",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feature vector of one window. `Default` is the all-zero vector used for
/// windows that contain no transactions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowFeatures {
    pub total_transactions_in_window: u64,
    pub incoming_tx_count: u64,
    pub outgoing_tx_count: u64,
    pub total_eth_volume_in: f64,
    pub total_eth_volume_out: f64,
    pub avg_eth_tx_value_in: f64,
    pub avg_eth_tx_value_out: f64,
    pub max_eth_tx_value_in: f64,
    pub max_eth_tx_value_out: f64,
    pub unique_counterparties_in: u64,
    pub unique_counterparties_out: u64,
    pub total_gas_fee_eth_spent_by_address: f64,
    pub avg_gas_fee_eth_spent_by_address: f64,
    pub avg_time_between_tx_sec: f64,
    pub std_time_between_tx_sec: f64,
    pub incoming_to_outgoing_volume_ratio: f64,
    pub incoming_to_outgoing_count_ratio: f64,
}

impl WindowFeatures {
    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::TotalTransactionsInWindow => self.total_transactions_in_window as f64,
            Feature::IncomingTxCount => self.incoming_tx_count as f64,
            Feature::OutgoingTxCount => self.outgoing_tx_count as f64,
            Feature::TotalEthVolumeIn => self.total_eth_volume_in,
            Feature::TotalEthVolumeOut => self.total_eth_volume_out,
            Feature::AvgEthTxValueIn => self.avg_eth_tx_value_in,
            Feature::AvgEthTxValueOut => self.avg_eth_tx_value_out,
            Feature::MaxEthTxValueIn => self.max_eth_tx_value_in,
            Feature::MaxEthTxValueOut => self.max_eth_tx_value_out,
            Feature::UniqueCounterpartiesIn => self.unique_counterparties_in as f64,
            Feature::UniqueCounterpartiesOut => self.unique_counterparties_out as f64,
            Feature::TotalGasFeeEthSpentByAddress => self.total_gas_fee_eth_spent_by_address,
            Feature::AvgGasFeeEthSpentByAddress => self.avg_gas_fee_eth_spent_by_address,
            Feature::AvgTimeBetweenTxSec => self.avg_time_between_tx_sec,
            Feature::StdTimeBetweenTxSec => self.std_time_between_tx_sec,
            Feature::IncomingToOutgoingVolumeRatio => self.incoming_to_outgoing_volume_ratio,
            Feature::IncomingToOutgoingCountRatio => self.incoming_to_outgoing_count_ratio,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_transactions_in_window == 0
    }
}

/// A half-open time slice `[window_start, window_end)` and its features.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub address: Address,
    pub features: WindowFeatures,
}

impl Window {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.window_start && at < self.window_end
    }
}
