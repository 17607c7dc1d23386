//! Listing analytics - functional pipeline from raw sources to aggregates
//!
//! load (fetch + parse) -> clean -> filter -> aggregate -> write

pub mod aggregate;
pub mod clean;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod load;
pub mod parse;
pub mod stats;
pub mod types;
pub mod utils;
pub mod write;

pub use error::{ExportError, SourceError};
pub use types::*;
