use chrono::Duration;

use crate::anomaly::{AnomalyEngine, Sentinel};
use crate::baseline::BaselineStatistics;
use crate::config::AnalysisConfig;
use crate::features::{extract_windows, shift};
use crate::ingest::{parse_address, Transaction};
use crate::report::{AnalysisReport, WindowReport};

/// Runs one full analysis per address:
/// 1. Split the history at `earliest + baseline_days`
/// 2. Window the baseline period and aggregate its statistics
/// 3. Window the current period
/// 4. Score current windows against the baseline
pub struct AnalysisPipeline {
    config: AnalysisConfig,
    anomaly_engine: AnomalyEngine,
}

impl AnalysisPipeline {
    pub fn new(config: AnalysisConfig) -> eyre::Result<Self> {
        config.validate()?;
        let anomaly_engine = AnomalyEngine::new(config.std_dev_multiplier);
        Ok(Self {
            config,
            anomaly_engine,
        })
    }

    /// Analyze the full transaction history of `address`.
    ///
    /// Empty inputs produce sentinel reports rather than errors. Errors are
    /// reserved for an unparseable address, an oversized history, or periods
    /// that run past representable time.
    pub fn run(&self, address: &str, transactions: &[Transaction]) -> eyre::Result<AnalysisReport> {
        let target = parse_address(address)?;

        let Some(first_tx_time) = transactions.iter().map(|tx| tx.timestamp).min() else {
            tracing::info!(%address, "No transaction data, nothing to analyze");
            return Ok(AnalysisReport::no_data(address, &self.config));
        };

        if let Some(max) = self.config.max_transactions {
            if transactions.len() > max {
                return Err(eyre::eyre!(
                    "Refusing to analyze {} transactions for {} (limit {})",
                    transactions.len(),
                    address,
                    max
                ));
            }
        }

        let params = self.config.window_params();
        let baseline_end = shift(first_tx_time, Duration::days(i64::from(self.config.baseline_days)))
            .map_err(|e| eyre::eyre!("Baseline period of {} days: {}", self.config.baseline_days, e))?;

        tracing::info!(%address, %baseline_end, "Establishing historical baseline");
        let baseline_windows = extract_windows(transactions, &target, &params, None, Some(baseline_end))?;
        let baseline = BaselineStatistics::from_windows(&baseline_windows);

        match &baseline {
            Some(b) => tracing::info!(
                windows = b.window_count(),
                features = b.len(),
                "Historical baseline computed"
            ),
            None => tracing::warn!(
                %address,
                "No activity in baseline period, falling back to fixed-threshold rules"
            ),
        }

        let current_windows = extract_windows(transactions, &target, &params, Some(baseline_end), None)?;

        let analysis_windows = if current_windows.is_empty() {
            tracing::info!(%address, "No current data to analyze after baseline period");
            vec![WindowReport::sentinel(Sentinel::NoCurrentDataAfterBaseline)]
        } else {
            tracing::info!(
                windows = current_windows.len(),
                "Detecting anomalies across current windows"
            );
            self.anomaly_engine.detect(&current_windows, baseline.as_ref())
        };

        Ok(AnalysisReport {
            address: address.to_string(),
            parameters: self.config.clone(),
            historical_baseline_stats_summary: baseline.map(|b| b.summary()).unwrap_or_default(),
            analysis_windows,
            error: None,
        })
    }
}
