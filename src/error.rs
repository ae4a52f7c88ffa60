//! Error types shared by the tree builder, the clustering engine and the
//! CSV adapter.
//!
//! Validation errors are raised before any computation starts, so a failed
//! call never leaves partially built state behind. Degenerate data (empty
//! subsets, empty clusters, non-convergence) is not an error.

use serde::ser::SerializeStruct;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// No feature columns were selected.
    #[error("Select at least one feature column")]
    NoFeatures,

    /// No target column was chosen.
    #[error("Select a target column")]
    NoTarget,

    /// A selected column does not exist in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// The target column was also selected as a feature.
    #[error("Column '{0}' cannot be both the target and a feature")]
    TargetAsFeature(String),

    /// k-means needs at least one numeric column.
    #[error("No numeric columns available for k-means")]
    NoNumericColumns,

    /// k-modes needs at least one categorical column.
    #[error("No categorical columns available for k-modes")]
    NoCategoricalColumns,

    /// A selected column has the wrong kind for the requested algorithm.
    #[error("Column '{column}' is not {expected}")]
    ColumnKind {
        column: String,
        expected: &'static str,
    },

    /// Class-seeded initialisation was requested but the class column is absent.
    #[error("Class column '{0}' not found in table")]
    ClassColumnMissing(String),

    /// The cluster count is outside `1..=rows`.
    #[error("Cannot form {k} clusters from {rows} complete rows")]
    InvalidClusterCount { k: usize, rows: usize },

    /// Every row has at least one missing feature value.
    #[error("No rows without missing values in the selected columns")]
    NoCompleteRows,

    /// Columns of one table must all have the same number of rows.
    #[error("Column '{column}' has {found} rows, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },

    /// Two columns share a name.
    #[error("Duplicate column name '{0}'")]
    DuplicateColumn(String),

    /// Configuration values are out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A per-iteration report was requested for an iteration that did not run.
    #[error("Iteration {iteration} was not recorded ({recorded} iterations ran)")]
    UnknownIteration { iteration: usize, recorded: usize },

    /// An action needs a loaded table.
    #[error("Load a table first")]
    NoTable,

    /// Prediction was requested before a tree was built.
    #[error("Build a decision tree first")]
    NoModel,

    /// The input file has a header but no data rows.
    #[error("The file has no data rows")]
    EmptyInput,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable code for UI handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoFeatures => "NO_FEATURES",
            Self::NoTarget => "NO_TARGET",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::TargetAsFeature(_) => "TARGET_AS_FEATURE",
            Self::NoNumericColumns => "NO_NUMERIC_COLUMNS",
            Self::NoCategoricalColumns => "NO_CATEGORICAL_COLUMNS",
            Self::ColumnKind { .. } => "COLUMN_KIND",
            Self::ClassColumnMissing(_) => "CLASS_COLUMN_MISSING",
            Self::InvalidClusterCount { .. } => "INVALID_CLUSTER_COUNT",
            Self::NoCompleteRows => "NO_COMPLETE_ROWS",
            Self::ColumnLength { .. } => "COLUMN_LENGTH",
            Self::DuplicateColumn(_) => "DUPLICATE_COLUMN",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::UnknownIteration { .. } => "UNKNOWN_ITERATION",
            Self::NoTable => "NO_TABLE",
            Self::NoModel => "NO_MODEL",
            Self::EmptyInput => "EMPTY_INPUT",
            Self::Csv(_) => "CSV_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }

    /// True for errors the user fixes by changing their selection.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            Self::EmptyInput | Self::Csv(_) | Self::Io(_) | Self::Json(_)
        )
    }
}

/// Serialized as `{ code, message }` so the UI can show it directly.
impl Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("Error", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(Error::NoFeatures.error_code(), "NO_FEATURES");
        assert_eq!(
            Error::ColumnNotFound("Play".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
    }

    #[test]
    fn test_is_validation() {
        assert!(Error::NoTarget.is_validation());
        assert!(Error::InvalidClusterCount { k: 3, rows: 2 }.is_validation());
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(!Error::Io(io).is_validation());
    }

    #[test]
    fn test_error_serialization() {
        let error = Error::ClassColumnMissing("Clase".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("CLASS_COLUMN_MISSING"));
        assert!(json.contains("Clase"));
    }
}
