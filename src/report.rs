use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::anomaly::{AnomalyFlag, Sentinel};
use crate::config::AnalysisConfig;
use crate::features::{Window, WindowFeatures};

/// Detector output for one current-period window, or a single sentinel entry
/// when nothing could be analyzed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowReport {
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<WindowFeatures>,
    pub anomalies_detected_in_window: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<AnomalyFlag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentinel: Option<Sentinel>,
}

impl WindowReport {
    /// An entry with no window bounds that only carries a sentinel message.
    pub fn sentinel(sentinel: Sentinel) -> Self {
        Self {
            window_start: None,
            window_end: None,
            features: None,
            anomalies_detected_in_window: vec![sentinel.message().to_string()],
            flags: Vec::new(),
            sentinel: Some(sentinel),
        }
    }

    pub fn for_window(window: &Window, flags: Vec<AnomalyFlag>) -> Self {
        let (anomalies, sentinel) = if flags.is_empty() {
            (vec![Sentinel::NoAnomalies.message().to_string()], Some(Sentinel::NoAnomalies))
        } else {
            (flags.iter().map(ToString::to_string).collect(), None)
        };

        Self {
            window_start: Some(window.window_start),
            window_end: Some(window.window_end),
            features: Some(window.features.clone()),
            anomalies_detected_in_window: anomalies,
            flags,
            sentinel,
        }
    }

    pub fn is_flagged(&self) -> bool {
        !self.flags.is_empty()
    }
}

/// Full result of analyzing one address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub address: String,
    pub parameters: AnalysisConfig,
    pub historical_baseline_stats_summary: BTreeMap<String, f64>,
    pub analysis_windows: Vec<WindowReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisReport {
    /// The report for an address with no transactions at all.
    pub fn no_data(address: &str, parameters: &AnalysisConfig) -> Self {
        Self {
            address: address.to_string(),
            parameters: parameters.clone(),
            historical_baseline_stats_summary: BTreeMap::new(),
            analysis_windows: vec![WindowReport::sentinel(Sentinel::NoTransactionData)],
            error: Some(Sentinel::NoTransactionData.message().to_string()),
        }
    }

    /// Total number of triggered checks across all windows.
    pub fn flag_count(&self) -> usize {
        self.analysis_windows.iter().map(|w| w.flags.len()).sum()
    }

    pub fn flagged_windows(&self) -> usize {
        self.analysis_windows.iter().filter(|w| w.is_flagged()).count()
    }

    /// The sentinel carried by a report that holds no analyzed window.
    pub fn sentinel(&self) -> Option<Sentinel> {
        match self.analysis_windows.as_slice() {
            [only] if only.window_start.is_none() => only.sentinel,
            _ => None,
        }
    }

    pub fn to_json(&self) -> eyre::Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| eyre::eyre!("Failed to serialize report for {}: {}", self.address, e))
    }

    pub fn write_json(&self, path: &Path) -> eyre::Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)
            .map_err(|e| eyre::eyre!("Failed to write report '{}': {}", path.display(), e))
    }
}
