//! Core types for review enrichment: column names, derived categories, and
//! the column normalizer that every table passes through before scoring.

mod error;
pub mod normalize;
pub mod review;
pub mod schema;

pub use error::NormalizeError;
pub use normalize::{NormalizedTable, Normalizer, SemanticField};
pub use review::{IssueTag, SentimentLabel, UnknownCategory};
pub use schema::reviews;
