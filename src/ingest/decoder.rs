use alloy::primitives::{Address, U256};
use bigdecimal::{BigDecimal, FromPrimitive, ToPrimitive};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::str::FromStr;

use super::types::{RawNumber, RawTransaction, Transaction};

/// ETH amounts are carried in wei.
const WEI_DECIMALS: u32 = 18;

/// Parse a hex address. Case is ignored, so checksummed and lower-cased
/// spellings of the same account compare equal.
pub fn parse_address(s: &str) -> eyre::Result<Address> {
    Address::from_str(s.trim()).map_err(|e| eyre::eyre!("Invalid address '{}': {}", s, e))
}

/// Decode a single raw record into a normalized transaction.
///
/// Fails with an input-validation error naming the transaction and field when
/// an address or numeric field cannot be parsed.
pub fn decode_transaction(raw: &RawTransaction) -> eyre::Result<Transaction> {
    let hash = raw.hash.trim().to_string();

    let from = parse_address(&raw.from)
        .map_err(|e| eyre::eyre!("Transaction {}: bad 'from' field: {}", hash, e))?;

    let to = match raw.to.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(addr) => Some(
            parse_address(addr)
                .map_err(|e| eyre::eyre!("Transaction {}: bad 'to' field: {}", hash, e))?,
        ),
    };

    let value = parse_amount(&raw.value).ok_or_else(|| field_error(&hash, "value", &raw.value))?;
    let gas_price =
        parse_amount(&raw.gas_price).ok_or_else(|| field_error(&hash, "gasPrice", &raw.gas_price))?;
    let gas_used =
        parse_amount(&raw.gas_used).ok_or_else(|| field_error(&hash, "gasUsed", &raw.gas_used))?;
    let timestamp = parse_timestamp(&raw.time_stamp)
        .ok_or_else(|| field_error(&hash, "timeStamp", &raw.time_stamp))?;

    Ok(Transaction {
        hash,
        from,
        to,
        value_eth: raw_to_eth(&value),
        gas_fee_eth: raw_to_eth(&(gas_price * gas_used)),
        timestamp,
    })
}

/// Decode a batch of raw records.
///
/// Records without a hash are dropped, duplicate hashes keep their first
/// occurrence, and the result is ordered by timestamp.
pub fn normalize(raws: &[RawTransaction]) -> eyre::Result<Vec<Transaction>> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(raws.len());
    let mut transactions = Vec::with_capacity(raws.len());
    let mut skipped = 0usize;

    for raw in raws {
        let hash = raw.hash.trim();
        if hash.is_empty() || !seen.insert(hash) {
            skipped += 1;
            continue;
        }
        transactions.push(decode_transaction(raw)?);
    }

    transactions.sort_by_key(|tx| tx.timestamp);

    if skipped > 0 {
        tracing::debug!(skipped, "Dropped records with missing or duplicate hashes");
    }

    Ok(transactions)
}

/// Convert a raw wei amount to ETH.
pub fn raw_to_eth(amount: &BigDecimal) -> f64 {
    let divisor = BigDecimal::from(10u64.pow(WEI_DECIMALS));
    let result = amount / divisor;
    result.to_f64().unwrap_or(0.0)
}

fn field_error(hash: &str, field: &str, raw: &RawNumber) -> eyre::Report {
    eyre::eyre!("Transaction {}: unparseable '{}' field: {}", hash, field, raw)
}

/// Parse a non-negative integer amount. Hex strings go through `U256` so that
/// full 256-bit values survive.
fn parse_amount(raw: &RawNumber) -> Option<BigDecimal> {
    let amount = match raw {
        RawNumber::Int(n) => BigDecimal::from(*n),
        RawNumber::Float(x) if x.is_finite() => BigDecimal::from_f64(*x)?,
        RawNumber::Float(_) => return None,
        RawNumber::Text(s) => {
            let s = s.trim();
            match s.strip_prefix("0x") {
                Some(hex) => {
                    let value = U256::from_str_radix(hex, 16).ok()?;
                    BigDecimal::from_str(&value.to_string()).ok()?
                }
                None => BigDecimal::from_str(s).ok()?,
            }
        }
    };

    if amount < BigDecimal::from(0) {
        return None;
    }
    Some(amount)
}

/// Parse Unix epoch seconds; fractional seconds are kept.
fn parse_timestamp(raw: &RawNumber) -> Option<DateTime<Utc>> {
    let secs = match raw {
        RawNumber::Int(n) => return DateTime::from_timestamp(i64::try_from(*n).ok()?, 0),
        RawNumber::Float(x) => *x,
        RawNumber::Text(s) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                return DateTime::from_timestamp(n, 0);
            }
            s.parse::<f64>().ok()?
        }
    };

    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = (((secs - whole) * 1e9).round() as u32).min(999_999_999);
    DateTime::from_timestamp(whole as i64, nanos)
}
