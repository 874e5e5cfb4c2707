use serde_json::Value as JsonValue;
use std::path::Path;

use super::decoder::normalize;
use super::types::{RawTransaction, Transaction};

/// Read a transaction file and normalize its records.
pub fn load_transactions(path: &Path) -> eyre::Result<Vec<Transaction>> {
    let raws = read_raw_transactions(path)?;
    let transactions = normalize(&raws)?;
    tracing::info!(
        path = %path.display(),
        records = raws.len(),
        transactions = transactions.len(),
        "Loaded transactions"
    );
    Ok(transactions)
}

/// Read raw records from a `.csv` file (header row using the Etherscan field
/// names) or from JSON.
///
/// JSON may be a bare array, an Etherscan response envelope (`{"result": [...]}`)
/// or a collector placeholder (`{"data": [...]}`). Any other layout reads as
/// no records.
pub fn read_raw_transactions(path: &Path) -> eyre::Result<Vec<RawTransaction>> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        read_csv(path)
    } else {
        read_json(path)
    }
}

fn read_csv(path: &Path) -> eyre::Result<Vec<RawTransaction>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("Failed to open transaction CSV '{}': {}", path.display(), e))?;

    let mut records = Vec::new();
    for (row, result) in reader.deserialize::<RawTransaction>().enumerate() {
        let record = result.map_err(|e| {
            eyre::eyre!("Failed to parse row {} of '{}': {}", row + 1, path.display(), e)
        })?;
        records.push(record);
    }
    Ok(records)
}

fn read_json(path: &Path) -> eyre::Result<Vec<RawTransaction>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("Failed to read transaction file '{}': {}", path.display(), e))?;
    let value: JsonValue = serde_json::from_str(&content)
        .map_err(|e| eyre::eyre!("Failed to parse JSON in '{}': {}", path.display(), e))?;

    let list = extract_record_list(value, path);

    serde_json::from_value(list)
        .map_err(|e| eyre::eyre!("Failed to decode transactions in '{}': {}", path.display(), e))
}

/// Pull the record list out of a collector file. Anything that is not a list
/// (a collector error object, a rate-limit message in `result`, `null`) means
/// the collector had no data, which is logged and read as an empty history.
fn extract_record_list(value: JsonValue, path: &Path) -> JsonValue {
    let reason = match value {
        JsonValue::Array(_) => return value,
        JsonValue::Null => return JsonValue::Array(Vec::new()),
        JsonValue::Object(mut map) => {
            if let Some(list) = ["result", "data"]
                .into_iter()
                .find_map(|key| map.remove(key).filter(JsonValue::is_array))
            {
                return list;
            }
            match map.get("error").or_else(|| map.get("message")) {
                Some(error) => format!("collector reported: {}", error),
                None => "object has no 'result' or 'data' list".to_string(),
            }
        }
        other => format!("expected a list of transactions, found {}", other),
    };

    tracing::warn!(
        path = %path.display(),
        reason = %reason,
        "No transaction list in input, treating as empty history"
    );
    JsonValue::Array(Vec::new())
}
