use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::baseline::stats::{mean, sample_std_dev};
use crate::ingest::Transaction;

use super::types::{Window, WindowFeatures};
use super::windows::{shift, window_starts, WindowParams};

/// Added to ratio denominators so an empty outgoing side never divides by zero.
const RATIO_EPSILON: f64 = 1e-9;

/// Split one address's transactions into windows and compute each window's
/// features.
///
/// Only transactions sent or received by `target` are considered, restricted to
/// `[period_start, period_end)` when either bound is given. Windows are emitted
/// for the whole schedule, including ones that hold no transactions.
pub fn extract_windows(
    transactions: &[Transaction],
    target: &Address,
    params: &WindowParams,
    period_start: Option<DateTime<Utc>>,
    period_end: Option<DateTime<Utc>>,
) -> eyre::Result<Vec<Window>> {
    params.validate()?;

    let mut related: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| tx.involves(target))
        .filter(|tx| period_start.map_or(true, |start| tx.timestamp >= start))
        .filter(|tx| period_end.map_or(true, |end| tx.timestamp < end))
        .collect();

    let (Some(first), Some(last)) = (
        related.iter().map(|tx| tx.timestamp).min(),
        related.iter().map(|tx| tx.timestamp).max(),
    ) else {
        return Ok(Vec::new());
    };

    related.sort_by_key(|tx| tx.timestamp);

    let windows = window_starts(first, last, params)?
        .into_iter()
        .map(|window_start| {
            let window_end = shift(window_start, params.window)?;
            let lo = related.partition_point(|tx| tx.timestamp < window_start);
            let hi = related.partition_point(|tx| tx.timestamp < window_end);
            Ok(Window {
                window_start,
                window_end,
                address: *target,
                features: compute_features(&related[lo..hi], target),
            })
        })
        .collect::<eyre::Result<Vec<Window>>>()?;

    tracing::debug!(
        address = %target,
        transactions = related.len(),
        windows = windows.len(),
        "Extracted windows"
    );

    Ok(windows)
}

/// Compute the feature vector of one window from its transactions, given in
/// time order. A self-transfer counts as both incoming and outgoing.
pub fn compute_features(txs: &[&Transaction], target: &Address) -> WindowFeatures {
    if txs.is_empty() {
        return WindowFeatures::default();
    }

    let incoming: Vec<&Transaction> = txs.iter().copied().filter(|tx| tx.is_incoming(target)).collect();
    let outgoing: Vec<&Transaction> = txs.iter().copied().filter(|tx| tx.is_outgoing(target)).collect();

    let values_in: Vec<f64> = incoming.iter().map(|tx| tx.value_eth).collect();
    let values_out: Vec<f64> = outgoing.iter().map(|tx| tx.value_eth).collect();
    let gas_fees: Vec<f64> = outgoing.iter().map(|tx| tx.gas_fee_eth).collect();

    let total_eth_volume_in: f64 = values_in.iter().sum();
    let total_eth_volume_out: f64 = values_out.iter().sum();

    let senders: HashSet<&Address> = incoming.iter().map(|tx| &tx.from).collect();
    let recipients: HashSet<&Address> = outgoing.iter().filter_map(|tx| tx.to.as_ref()).collect();

    let gaps_sec: Vec<f64> = txs
        .windows(2)
        .map(|pair| (pair[1].timestamp - pair[0].timestamp).num_milliseconds() as f64 / 1000.0)
        .collect();

    WindowFeatures {
        total_transactions_in_window: txs.len() as u64,
        incoming_tx_count: incoming.len() as u64,
        outgoing_tx_count: outgoing.len() as u64,
        total_eth_volume_in,
        total_eth_volume_out,
        avg_eth_tx_value_in: mean(&values_in).unwrap_or(0.0),
        avg_eth_tx_value_out: mean(&values_out).unwrap_or(0.0),
        max_eth_tx_value_in: max_or_zero(&values_in),
        max_eth_tx_value_out: max_or_zero(&values_out),
        unique_counterparties_in: senders.len() as u64,
        unique_counterparties_out: recipients.len() as u64,
        total_gas_fee_eth_spent_by_address: gas_fees.iter().sum(),
        avg_gas_fee_eth_spent_by_address: mean(&gas_fees).unwrap_or(0.0),
        avg_time_between_tx_sec: mean(&gaps_sec).unwrap_or(0.0),
        std_time_between_tx_sec: sample_std_dev(&gaps_sec).unwrap_or(0.0),
        incoming_to_outgoing_volume_ratio: total_eth_volume_in
            / (total_eth_volume_out + RATIO_EPSILON),
        incoming_to_outgoing_count_ratio: incoming.len() as f64
            / (outgoing.len() as f64 + RATIO_EPSILON),
    }
}

fn max_or_zero(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{Feature, TailPolicy};
    use chrono::Duration;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn base() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn tx(from: Address, to: Address, eth: f64, hours: i64) -> Transaction {
        Transaction {
            hash: format!("0x{:x}{}", from[0], hours),
            from,
            to: Some(to),
            value_eth: eth,
            gas_fee_eth: 0.001,
            timestamp: base() + Duration::hours(hours),
        }
    }

    #[test]
    fn test_no_related_transactions() {
        let txs = vec![tx(addr(2), addr(3), 1.0, 0)];
        let params = WindowParams::from_hours(24, 6, TailPolicy::Snap);
        let windows = extract_windows(&txs, &addr(1), &params, None, None).unwrap();
        assert!(windows.is_empty());
    }

    #[test]
    fn test_period_bounds_are_half_open() {
        let me = addr(1);
        let txs = vec![tx(addr(2), me, 1.0, 0), tx(addr(2), me, 2.0, 10), tx(addr(2), me, 3.0, 20)];
        let params = WindowParams::from_hours(1, 1, TailPolicy::Snap);

        let windows = extract_windows(
            &txs,
            &me,
            &params,
            Some(base() + Duration::hours(10)),
            Some(base() + Duration::hours(20)),
        )
        .unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].window_start, base() + Duration::hours(10));
        assert_eq!(windows[0].features.total_eth_volume_in, 2.0);
    }

    #[test]
    fn test_features_in_and_out() {
        let me = addr(1);
        let txs = vec![
            tx(addr(2), me, 1.0, 0),
            tx(addr(3), me, 3.0, 1),
            tx(addr(2), me, 2.0, 2),
            tx(me, addr(4), 5.0, 3),
        ];
        let params = WindowParams::from_hours(24, 24, TailPolicy::Snap);
        let windows = extract_windows(&txs, &me, &params, None, None).unwrap();
        assert_eq!(windows.len(), 1);

        let f = &windows[0].features;
        assert_eq!(f.total_transactions_in_window, 4);
        assert_eq!(f.incoming_tx_count, 3);
        assert_eq!(f.outgoing_tx_count, 1);
        assert_eq!(f.total_eth_volume_in, 6.0);
        assert_eq!(f.total_eth_volume_out, 5.0);
        assert_eq!(f.avg_eth_tx_value_in, 2.0);
        assert_eq!(f.max_eth_tx_value_in, 3.0);
        assert_eq!(f.max_eth_tx_value_out, 5.0);
        assert_eq!(f.unique_counterparties_in, 2);
        assert_eq!(f.unique_counterparties_out, 1);
        assert!((f.total_gas_fee_eth_spent_by_address - 0.001).abs() < 1e-15);
        assert_eq!(f.avg_time_between_tx_sec, 3600.0);
        assert_eq!(f.std_time_between_tx_sec, 0.0);
        assert!((f.incoming_to_outgoing_volume_ratio - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_empty_window_is_zero_filled() {
        let me = addr(1);
        let txs = vec![tx(addr(2), me, 1.0, 0), tx(addr(2), me, 1.0, 5)];
        let params = WindowParams::from_hours(1, 1, TailPolicy::Snap);
        let windows = extract_windows(&txs, &me, &params, None, None).unwrap();
        assert_eq!(windows.len(), 6);
        for w in &windows[1..5] {
            assert_eq!(w.features, WindowFeatures::default());
            assert!(Feature::ALL.iter().all(|f| w.features.get(*f) == 0.0));
        }
    }

    #[test]
    fn test_ratios_stay_finite_without_outgoing() {
        let me = addr(1);
        let txs = vec![tx(addr(2), me, 7.0, 0)];
        let params = WindowParams::from_hours(24, 6, TailPolicy::Snap);
        let f = &extract_windows(&txs, &me, &params, None, None).unwrap()[0].features;
        assert!(f.incoming_to_outgoing_volume_ratio.is_finite());
        assert!(f.incoming_to_outgoing_count_ratio.is_finite());
        assert!(f.incoming_to_outgoing_count_ratio > 1e8);
        assert_eq!(f.avg_time_between_tx_sec, 0.0);
        assert_eq!(f.max_eth_tx_value_out, 0.0);
    }

    #[test]
    fn test_self_transfer_counts_both_ways() {
        let me = addr(1);
        let txs = vec![tx(me, me, 1.0, 0)];
        let params = WindowParams::from_hours(24, 6, TailPolicy::Snap);
        let f = &extract_windows(&txs, &me, &params, None, None).unwrap()[0].features;
        assert_eq!(f.total_transactions_in_window, 1);
        assert_eq!(f.incoming_tx_count, 1);
        assert_eq!(f.outgoing_tx_count, 1);
    }

    #[test]
    fn test_contract_creation_counts_as_outgoing() {
        let me = addr(1);
        let mut create = tx(me, addr(0), 0.5, 1);
        create.to = None;
        let txs = vec![tx(me, addr(4), 1.0, 0), create];
        let params = WindowParams::from_hours(24, 6, TailPolicy::Snap);
        let f = &extract_windows(&txs, &me, &params, None, None).unwrap()[0].features;
        assert_eq!(f.total_transactions_in_window, 2);
        assert_eq!(f.outgoing_tx_count, 2);
        assert_eq!(f.incoming_tx_count, 0);
        assert_eq!(f.total_eth_volume_out, 1.5);
        assert_eq!(f.unique_counterparties_out, 1);
        assert!((f.total_gas_fee_eth_spent_by_address - 0.002).abs() < 1e-15);
    }

    #[test]
    fn test_window_past_representable_time_is_error() {
        let me = addr(1);
        let txs = vec![tx(addr(2), me, 1.0, 0)];
        let params = WindowParams::from_hours(4_000_000_000, 6, TailPolicy::Snap);
        assert!(extract_windows(&txs, &me, &params, None, None).is_err());
    }

    #[test]
    fn test_snapped_window_overlaps_previous() {
        let me = addr(1);
        let txs = vec![tx(addr(2), me, 1.0, 0), tx(addr(2), me, 1.0, 15)];
        let params = WindowParams::from_hours(2, 10, TailPolicy::Snap);
        let windows = extract_windows(&txs, &me, &params, None, None).unwrap();
        assert_eq!(windows.len(), 3);
        let last = windows.last().unwrap();
        assert!(last.contains(base() + Duration::hours(15)));
        assert_eq!(last.features.total_transactions_in_window, 1);
    }
}
