//! Domain error types for the preparation pipeline and indicator engine.

use serde::Serialize;
use thiserror::Error;

/// Why a cleaned table could not become a `PriceTable`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// One or more of Open/High/Low is absent.
    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// None of the accepted close-like names is present.
    #[error("no close-like column (expected one of: {})", .candidates.join(", "))]
    NoCloseColumn { candidates: Vec<String> },

    /// A row carries a missing or non-finite value in a required field.
    #[error("row {row} ({key}): invalid value in {}", .fields.join(", "))]
    InvalidRow {
        row: usize,
        key: String,
        fields: Vec<String>,
    },

    /// The index is not strictly increasing at `row`.
    #[error("row {row} ({key}): index is not strictly chronological")]
    UnorderedIndex { row: usize, key: String },

    /// A column is shorter or longer than the index.
    #[error("column {column} has {actual} values, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("table has no rows")]
    Empty,
}

/// Caller-supplied indicator parameters outside the accepted range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("{name} must be a positive integer, got {value}")]
    NonPositive { name: &'static str, value: usize },

    #[error("{name} must be within {min}..={max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },
}

/// Failure of an indicator computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The close series holds a non-finite value. Unreachable for tables that
    /// went through validation.
    #[error("close series is not numeric at position {position}")]
    NonNumericClose { position: usize },
}

/// A column that could not be fully coerced to numbers. Non-fatal: the
/// offending cells were replaced by missing markers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoercionWarning {
    pub column: String,
    /// Number of non-blank cells that failed coercion.
    pub failed_cells: usize,
    /// Row position of the first failing cell.
    pub first_row: usize,
    /// The first failing cell's original text.
    pub sample: String,
}

impl std::fmt::Display for CoercionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "column {}: {} value(s) could not be converted to numbers (first at row {}: {:?})",
            self.column, self.failed_cells, self.first_row, self.sample
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_message_names_every_field() {
        let err = ValidationError::MissingColumns(vec!["High".into(), "Low".into()]);
        assert_eq!(err.to_string(), "missing required column(s): High, Low");
    }

    #[test]
    fn invalid_row_message_includes_row_and_fields() {
        let err = ValidationError::InvalidRow {
            row: 2,
            key: "2024-01-03".into(),
            fields: vec!["Close".into()],
        };
        assert_eq!(err.to_string(), "row 2 (2024-01-03): invalid value in Close");
    }
}
