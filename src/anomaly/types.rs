use serde::Serialize;
use std::fmt;

use crate::features::Feature;

/// How a feature deviated, with the baseline figures that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnomalyKind {
    High {
        mean: f64,
        std_dev: f64,
        upper_bound: f64,
    },
    Low {
        mean: f64,
        std_dev: f64,
        lower_bound: f64,
    },
    /// The baseline never varied and the current value rose above it.
    DeviationFromConstant { mean: f64 },
    /// Fallback when no baseline exists for the transaction count.
    HighTransactionCount { threshold: f64 },
    /// Fallback when no baseline exists for the largest outgoing transfer.
    LargeOutgoingTransaction { threshold: f64 },
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High { .. } => "high",
            Self::Low { .. } => "low",
            Self::DeviationFromConstant { .. } => "deviation_from_constant",
            Self::HighTransactionCount { .. } => "high_transaction_count",
            Self::LargeOutgoingTransaction { .. } => "large_outgoing_transaction",
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            Self::HighTransactionCount { .. } | Self::LargeOutgoingTransaction { .. }
        )
    }
}

/// One triggered check on one feature of one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnomalyFlag {
    pub feature: Feature,
    pub value: f64,
    #[serde(flatten)]
    pub kind: AnomalyKind,
}

impl fmt::Display for AnomalyFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let feature = self.feature;
        let value = self.value;
        match self.kind {
            AnomalyKind::High {
                mean,
                std_dev,
                upper_bound,
            } => write!(
                f,
                "High Anomaly for {}: {:.2} (Historical Mean: {:.2}, Std: {:.2}, Upper Bound: {:.2})",
                feature, value, mean, std_dev, upper_bound
            ),
            AnomalyKind::Low {
                mean,
                std_dev,
                lower_bound,
            } => write!(
                f,
                "Low Anomaly for {}: {:.2} (Historical Mean: {:.2}, Std: {:.2}, Lower Bound: {:.2})",
                feature, value, mean, std_dev, lower_bound
            ),
            AnomalyKind::DeviationFromConstant { mean } => write!(
                f,
                "Deviation from Constant for {}: {:.2} (Historical Value: {:.2})",
                feature, value, mean
            ),
            AnomalyKind::HighTransactionCount { .. } => write!(
                f,
                "High Transaction Count (fallback rule): {:.0} transactions.",
                value
            ),
            AnomalyKind::LargeOutgoingTransaction { .. } => write!(
                f,
                "Large Outgoing Transaction (fallback rule): Max {:.2} ETH sent.",
                value
            ),
        }
    }
}

/// Placeholder outcomes that stand in for results when there is nothing to
/// score, or nothing was found. None of them is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentinel {
    NoTransactionData,
    NoCurrentWindows,
    NoBaselineProvided,
    NoCurrentDataAfterBaseline,
    NoAnomalies,
}

impl Sentinel {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoTransactionData => "No transaction data",
            Self::NoCurrentWindows => "No current windowed features to analyze.",
            Self::NoBaselineProvided => "No historical baselines provided.",
            Self::NoCurrentDataAfterBaseline => {
                "No current data to analyze after baseline period."
            }
            Self::NoAnomalies => {
                "No specific anomalies detected in this window based on historical baselines."
            }
        }
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
