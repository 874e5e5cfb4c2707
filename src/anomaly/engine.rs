use crate::baseline::BaselineStatistics;
use crate::features::Window;
use crate::report::WindowReport;

use super::rules::{self, CHECKED_FEATURES};
use super::types::{AnomalyFlag, Sentinel};

/// Scores current-period windows against baseline statistics.
pub struct AnomalyEngine {
    std_dev_multiplier: f64,
}

impl AnomalyEngine {
    pub fn new(std_dev_multiplier: f64) -> Self {
        Self { std_dev_multiplier }
    }

    /// Produce one report entry per window, in window order.
    ///
    /// `baseline` is `None` when the baseline period produced no windows; every
    /// feature then falls back to the fixed-threshold rules. An empty window
    /// list, or a baseline with no entries, yields a single sentinel entry.
    pub fn detect(
        &self,
        windows: &[Window],
        baseline: Option<&BaselineStatistics>,
    ) -> Vec<WindowReport> {
        if windows.is_empty() {
            return vec![WindowReport::sentinel(Sentinel::NoCurrentWindows)];
        }
        if baseline.is_some_and(BaselineStatistics::is_empty) {
            return vec![WindowReport::sentinel(Sentinel::NoBaselineProvided)];
        }

        let reports: Vec<WindowReport> = windows
            .iter()
            .map(|window| {
                let flags = self.analyze_window(window, baseline);
                if !flags.is_empty() {
                    tracing::warn!(
                        address = %window.address,
                        window_start = %window.window_start,
                        window_end = %window.window_end,
                        flags = ?flags.iter().map(|f| f.kind.as_str()).collect::<Vec<_>>(),
                        "ANOMALY DETECTED"
                    );
                }
                WindowReport::for_window(window, flags)
            })
            .collect();

        tracing::info!(
            windows = reports.len(),
            flagged = reports.iter().filter(|r| r.is_flagged()).count(),
            with_baseline = baseline.is_some(),
            "Anomaly detection complete"
        );

        reports
    }

    /// Run every checked feature of one window through the rules.
    pub fn analyze_window(
        &self,
        window: &Window,
        baseline: Option<&BaselineStatistics>,
    ) -> Vec<AnomalyFlag> {
        CHECKED_FEATURES
            .iter()
            .flat_map(|&feature| {
                rules::check_feature(
                    feature,
                    window.features.get(feature),
                    baseline.and_then(|b| b.get(feature)),
                    self.std_dev_multiplier,
                )
            })
            .collect()
    }
}
