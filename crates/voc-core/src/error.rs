use arrow::error::ArrowError;
use thiserror::Error;

use crate::normalize::SemanticField;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("missing required column: no input column maps to `{0}`")]
    MissingRequiredColumn(SemanticField),

    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
}
