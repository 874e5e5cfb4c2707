pub mod decoder;
pub mod loader;
pub mod types;

pub use decoder::{normalize, parse_address};
pub use loader::{load_transactions, read_raw_transactions};
pub use types::{RawNumber, RawTransaction, Transaction};
