use crate::baseline::FeatureStats;
use crate::features::Feature;

use super::types::{AnomalyFlag, AnomalyKind};

/// Standard deviations and means at or below this are treated as zero.
pub const NEAR_ZERO: f64 = 1e-9;

/// Fallback threshold on the window transaction count.
pub const FALLBACK_MAX_TRANSACTIONS: f64 = 50.0;

/// Fallback threshold on the largest outgoing transfer, in ETH.
pub const FALLBACK_MAX_OUTGOING_ETH: f64 = 50.0;

/// Features scored against the baseline, in check order.
pub const CHECKED_FEATURES: [Feature; 8] = [
    Feature::TotalTransactionsInWindow,
    Feature::IncomingTxCount,
    Feature::OutgoingTxCount,
    Feature::TotalEthVolumeIn,
    Feature::TotalEthVolumeOut,
    Feature::MaxEthTxValueIn,
    Feature::MaxEthTxValueOut,
    Feature::TotalGasFeeEthSpentByAddress,
];

/// Check if a value rises above `mean + k * std`. Needs a defined deviation.
pub fn check_high(feature: Feature, value: f64, stats: &FeatureStats, k: f64) -> Option<AnomalyFlag> {
    let std_dev = stats.std_dev?;
    let upper_bound = stats.upper_bound(k)?;
    if value > upper_bound {
        return Some(AnomalyFlag {
            feature,
            value,
            kind: AnomalyKind::High {
                mean: stats.mean,
                std_dev,
                upper_bound,
            },
        });
    }
    None
}

/// Check if a value drops below `mean - k * std`.
///
/// Peak-value features are never flagged low, and a drop is only meaningful
/// when the baseline mean was above zero.
pub fn check_low(feature: Feature, value: f64, stats: &FeatureStats, k: f64) -> Option<AnomalyFlag> {
    if matches!(feature, Feature::MaxEthTxValueIn | Feature::MaxEthTxValueOut) {
        return None;
    }

    let mean = stats.mean;
    let std_dev = stats.std_dev?;
    let lower_bound = stats.lower_bound(k)?;
    if value < lower_bound && value < mean && mean > NEAR_ZERO {
        return Some(AnomalyFlag {
            feature,
            value,
            kind: AnomalyKind::Low {
                mean,
                std_dev,
                lower_bound,
            },
        });
    }
    None
}

/// Check a value against a baseline that never varied. Only upward moves count.
pub fn check_constant(feature: Feature, value: f64, mean: f64) -> Option<AnomalyFlag> {
    if value > mean {
        return Some(AnomalyFlag {
            feature,
            value,
            kind: AnomalyKind::DeviationFromConstant { mean },
        });
    }
    None
}

/// Fixed-threshold rules for features that have no baseline. Only the
/// transaction count and the largest outgoing transfer have one; every other
/// feature goes unchecked.
pub fn check_fallback(feature: Feature, value: f64) -> Option<AnomalyFlag> {
    let kind = match feature {
        Feature::TotalTransactionsInWindow if value > FALLBACK_MAX_TRANSACTIONS => {
            AnomalyKind::HighTransactionCount {
                threshold: FALLBACK_MAX_TRANSACTIONS,
            }
        }
        Feature::MaxEthTxValueOut if value > FALLBACK_MAX_OUTGOING_ETH => {
            AnomalyKind::LargeOutgoingTransaction {
                threshold: FALLBACK_MAX_OUTGOING_ETH,
            }
        }
        _ => return None,
    };

    Some(AnomalyFlag {
        feature,
        value,
        kind,
    })
}

/// Run every applicable check for one feature value.
///
/// With baseline statistics the value is scored against `mean ± k * std`, or
/// against the constant mean when the deviation is near zero or undefined
/// (single-window baseline). Without statistics the fallback rules apply.
pub fn check_feature(
    feature: Feature,
    value: f64,
    stats: Option<&FeatureStats>,
    k: f64,
) -> Vec<AnomalyFlag> {
    let Some(stats) = stats else {
        return check_fallback(feature, value).into_iter().collect();
    };

    match stats.std_dev {
        Some(std_dev) if std_dev > NEAR_ZERO => [
            check_high(feature, value, stats, k),
            check_low(feature, value, stats, k),
        ]
        .into_iter()
        .flatten()
        .collect(),
        _ => check_constant(feature, value, stats.mean).into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(mean: f64, std_dev: f64) -> FeatureStats {
        FeatureStats {
            mean,
            std_dev: Some(std_dev),
        }
    }

    #[test]
    fn test_high_above_upper_bound() {
        let flags = check_feature(Feature::TotalEthVolumeIn, 20.0, Some(&stats(10.0, 2.0)), 3.0);
        assert_eq!(flags.len(), 1);
        match flags[0].kind {
            AnomalyKind::High { upper_bound, .. } => assert_eq!(upper_bound, 16.0),
            other => panic!("unexpected kind {:?}", other),
        }
        assert_eq!(
            flags[0].to_string(),
            "High Anomaly for total_eth_volume_in: 20.00 (Historical Mean: 10.00, Std: 2.00, Upper Bound: 16.00)"
        );
    }

    #[test]
    fn test_value_on_bound_is_not_flagged() {
        let flags = check_feature(Feature::TotalEthVolumeIn, 16.0, Some(&stats(10.0, 2.0)), 3.0);
        assert!(flags.is_empty());
    }

    #[test]
    fn test_low_below_lower_bound() {
        let flags = check_feature(Feature::IncomingTxCount, 0.0, Some(&stats(10.0, 2.0)), 3.0);
        assert_eq!(flags.len(), 1);
        assert!(matches!(flags[0].kind, AnomalyKind::Low { lower_bound, .. } if lower_bound == 4.0));
    }

    #[test]
    fn test_low_skipped_for_peak_features() {
        let flags = check_feature(Feature::MaxEthTxValueIn, 0.0, Some(&stats(10.0, 2.0)), 3.0);
        assert!(flags.is_empty());
    }

    #[test]
    fn test_low_skipped_for_near_zero_mean() {
        assert!(check_low(Feature::OutgoingTxCount, -1.0, &stats(1e-10, 1e-10 / 6.0), 3.0).is_none());
    }

    #[test]
    fn test_spread_checks_need_a_deviation() {
        let single = FeatureStats {
            mean: 3.0,
            std_dev: None,
        };
        assert!(check_high(Feature::TotalEthVolumeIn, 100.0, &single, 3.0).is_none());
        assert!(check_low(Feature::TotalEthVolumeIn, 0.0, &single, 3.0).is_none());
    }

    #[test]
    fn test_constant_baseline_only_checks_upward() {
        let constant = stats(5.0, 0.0);
        assert_eq!(check_feature(Feature::OutgoingTxCount, 6.0, Some(&constant), 3.0).len(), 1);
        assert!(check_feature(Feature::OutgoingTxCount, 4.0, Some(&constant), 3.0).is_empty());
        assert!(check_feature(Feature::OutgoingTxCount, 5.0, Some(&constant), 3.0).is_empty());
    }

    #[test]
    fn test_undefined_std_is_constant() {
        let single = FeatureStats {
            mean: 3.0,
            std_dev: None,
        };
        let flags = check_feature(Feature::TotalTransactionsInWindow, 4.0, Some(&single), 3.0);
        assert_eq!(flags.len(), 1);
        assert_eq!(
            flags[0].to_string(),
            "Deviation from Constant for total_transactions_in_window: 4.00 (Historical Value: 3.00)"
        );
    }

    #[test]
    fn test_fallback_rules() {
        let flags = check_feature(Feature::TotalTransactionsInWindow, 51.0, None, 3.0);
        assert_eq!(flags.len(), 1);
        assert_eq!(
            flags[0].to_string(),
            "High Transaction Count (fallback rule): 51 transactions."
        );
        assert!(check_feature(Feature::TotalTransactionsInWindow, 50.0, None, 3.0).is_empty());

        let flags = check_feature(Feature::MaxEthTxValueOut, 75.5, None, 3.0);
        assert_eq!(
            flags[0].to_string(),
            "Large Outgoing Transaction (fallback rule): Max 75.50 ETH sent."
        );

        // no fallback exists for other features
        assert!(check_feature(Feature::TotalEthVolumeOut, 1e6, None, 3.0).is_empty());
        assert!(check_feature(Feature::MaxEthTxValueIn, 1e6, None, 3.0).is_empty());
    }
}
