//! Storage layer: CSV parsing and serialization of review tables.

mod csv;
mod error;

pub use csv::{parse_csv, read_csv, serialize_csv, write_csv};
pub use error::StoreError;
