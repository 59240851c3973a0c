// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Drift evaluation error types.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which dataset a schema problem was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetSide {
    /// The newer window used as the baseline.
    Reference,
    /// The older window tested against the baseline.
    Comparison,
    /// The unpartitioned dataset returned by the data source.
    Source,
}

impl fmt::Display for DatasetSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetSide::Reference => write!(f, "reference"),
            DatasetSide::Comparison => write!(f, "comparison"),
            DatasetSide::Source => write!(f, "source"),
        }
    }
}

/// Errors that abort a drift evaluation.
#[derive(Error, Debug)]
pub enum DriftError {
    #[error("schema mismatch: column '{column}' missing from {side} dataset")]
    SchemaMismatch { column: String, side: DatasetSide },

    #[error("unsupported stattest '{name}': {reason}")]
    UnsupportedTest { name: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid value in column '{column}': {value}")]
    InvalidValue { column: String, value: String },

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DriftError {
    pub(crate) fn missing(column: impl Into<String>, side: DatasetSide) -> Self {
        DriftError::SchemaMismatch {
            column: column.into(),
            side,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_mismatch_names_column_and_side() {
        let err = DriftError::missing("age", DatasetSide::Comparison);
        assert_eq!(
            err.to_string(),
            "schema mismatch: column 'age' missing from comparison dataset"
        );
    }

    #[test]
    fn test_unsupported_test_display() {
        let err = DriftError::UnsupportedTest {
            name: "anderson".to_string(),
            reason: "unknown identifier".to_string(),
        };
        assert!(err.to_string().contains("anderson"));
        assert!(err.to_string().contains("unknown identifier"));
    }
}
