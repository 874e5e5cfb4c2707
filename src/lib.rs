//! Windowed feature extraction and historical-baseline anomaly detection for
//! the transaction history of a single on-chain address.

pub mod anomaly;
pub mod baseline;
pub mod cli;
pub mod config;
pub mod features;
pub mod ingest;
pub mod pipeline;
pub mod report;
