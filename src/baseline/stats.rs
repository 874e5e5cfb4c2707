use serde::Serialize;
use std::collections::BTreeMap;

use crate::features::{Feature, Window};

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator), `None` below two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sq_diff: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sq_diff / (values.len() - 1) as f64).sqrt())
}

/// Historical statistics of one feature across the baseline windows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureStats {
    pub mean: f64,
    /// Undefined when the baseline holds a single window.
    pub std_dev: Option<f64>,
}

impl FeatureStats {
    pub fn upper_bound(&self, k: f64) -> Option<f64> {
        self.std_dev.map(|std| self.mean + k * std)
    }

    pub fn lower_bound(&self, k: f64) -> Option<f64> {
        self.std_dev.map(|std| self.mean - k * std)
    }
}

/// Per-feature statistics of the baseline period. A feature with no entry has
/// no baseline, which is not the same as a zero baseline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaselineStatistics {
    stats: BTreeMap<Feature, FeatureStats>,
    window_count: usize,
}

impl BaselineStatistics {
    /// Aggregate every feature over the given windows. Returns `None` when there
    /// are no windows, since no baseline exists then.
    pub fn from_windows(windows: &[Window]) -> Option<Self> {
        if windows.is_empty() {
            return None;
        }

        let mut stats = BTreeMap::new();
        for feature in Feature::ALL {
            let values: Vec<f64> = windows.iter().map(|w| w.features.get(feature)).collect();
            if let Some(m) = mean(&values) {
                stats.insert(
                    feature,
                    FeatureStats {
                        mean: m,
                        std_dev: sample_std_dev(&values),
                    },
                );
            }
        }

        Some(Self {
            stats,
            window_count: windows.len(),
        })
    }

    pub fn insert(&mut self, feature: Feature, stats: FeatureStats) {
        self.stats.insert(feature, stats);
    }

    pub fn get(&self, feature: Feature) -> Option<&FeatureStats> {
        self.stats.get(&feature)
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn window_count(&self) -> usize {
        self.window_count
    }

    /// Flat `<feature>_mean` / `<feature>_std` map holding only finite values.
    pub fn summary(&self) -> BTreeMap<String, f64> {
        let mut summary = BTreeMap::new();
        for (feature, stats) in &self.stats {
            if stats.mean.is_finite() {
                summary.insert(format!("{}_mean", feature), stats.mean);
            }
            if let Some(std) = stats.std_dev.filter(|s| s.is_finite()) {
                summary.insert(format!("{}_std", feature), std);
            }
        }
        summary
    }
}
