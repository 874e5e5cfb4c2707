pub mod extractor;
pub mod types;
pub mod windows;

pub use extractor::{compute_features, extract_windows};
pub use types::{Feature, Window, WindowFeatures};
pub use windows::{shift, window_starts, TailPolicy, WindowParams};
