// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Per-feature drift evaluation
//!
//! Runs the configured two-sample test for every monitored column and flags
//! drift when the score exceeds the threshold.

use tracing::{debug, warn};

use crate::dataset::{Dataset, Value};
use crate::error::{DatasetSide, DriftError};
use crate::features::{FeatureKind, FeatureSet, FeatureSpec};
use crate::report::FeatureDriftResult;
use crate::stattest::{FeatureSample, StatTest, TestSelection};

/// Default drift threshold.
pub const DEFAULT_THRESHOLD: f64 = 0.15;

/// Drift evaluator: a test per feature kind and a threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftEvaluator {
    tests: TestSelection,
    threshold: f64,
}

impl Default for DriftEvaluator {
    fn default() -> Self {
        Self {
            tests: TestSelection::default(),
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl DriftEvaluator {
    /// Create an evaluator. `threshold` must be finite and non-negative.
    pub fn new(tests: TestSelection, threshold: f64) -> Result<Self, DriftError> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(DriftError::InvalidConfig(format!(
                "threshold must be a non-negative number, got {}",
                threshold
            )));
        }
        Ok(Self { tests, threshold })
    }

    pub fn tests(&self) -> TestSelection {
        self.tests
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Evaluate every feature of `features`, in set order.
    ///
    /// Every feature must be a column of both datasets, otherwise the whole
    /// evaluation fails with [`DriftError::SchemaMismatch`] and nothing is
    /// returned. If either dataset has no records the tests are skipped and
    /// every feature reports a zero score without drift.
    pub fn evaluate(
        &self,
        reference: &Dataset,
        comparison: &Dataset,
        features: &FeatureSet,
    ) -> Result<Vec<FeatureDriftResult>, DriftError> {
        for spec in features.iter() {
            if !reference.has_column(&spec.name) {
                return Err(DriftError::missing(&spec.name, DatasetSide::Reference));
            }
            if !comparison.has_column(&spec.name) {
                return Err(DriftError::missing(&spec.name, DatasetSide::Comparison));
            }
        }

        if reference.is_empty() || comparison.is_empty() {
            warn!(
                reference_rows = reference.len(),
                comparison_rows = comparison.len(),
                "empty window, skipping statistical comparison"
            );
            return Ok(features.iter().map(|spec| self.no_drift(spec)).collect());
        }

        let mut results = Vec::with_capacity(features.len());
        for spec in features.iter() {
            let test = self.tests.for_kind(spec.kind);
            let sample = extract_sample(spec, reference, comparison)?;

            let score = if sample.has_empty_side() {
                warn!(feature = %spec.name, "no values on one side, skipping test");
                0.0
            } else if sample.is_constant() {
                0.0
            } else {
                test.score(&sample)?
            };

            let drift_detected = score > self.threshold;
            debug!(
                feature = %spec.name,
                stattest = %test,
                score,
                threshold = self.threshold,
                drift_detected,
                "evaluated feature"
            );

            results.push(FeatureDriftResult {
                feature: spec.name.clone(),
                drift_detected,
                stattest_name: test.display_name().to_string(),
                drift_score: score,
            });
        }
        Ok(results)
    }

    fn no_drift(&self, spec: &FeatureSpec) -> FeatureDriftResult {
        let test: StatTest = self.tests.for_kind(spec.kind);
        FeatureDriftResult {
            feature: spec.name.clone(),
            drift_detected: false,
            stattest_name: test.display_name().to_string(),
            drift_score: 0.0,
        }
    }
}

/// Collect non-missing values of one column on both sides.
fn extract_sample(
    spec: &FeatureSpec,
    reference: &Dataset,
    comparison: &Dataset,
) -> Result<FeatureSample, DriftError> {
    match spec.kind {
        FeatureKind::Numerical => Ok(FeatureSample::Numerical {
            reference: numeric_values(&spec.name, reference)?,
            comparison: numeric_values(&spec.name, comparison)?,
        }),
        FeatureKind::Categorical => Ok(FeatureSample::Categorical {
            reference: reference.column(&spec.name).filter_map(Value::category).collect(),
            comparison: comparison.column(&spec.name).filter_map(Value::category).collect(),
        }),
    }
}

/// Finite numbers of a column. Missing and non-finite cells are skipped.
fn numeric_values(column: &str, data: &Dataset) -> Result<Vec<f64>, DriftError> {
    let mut values = Vec::with_capacity(data.len());
    for value in data.column(column) {
        if value.is_missing() {
            continue;
        }
        match value.as_f64() {
            Some(x) if x.is_finite() => values.push(x),
            Some(_) => {}
            None => {
                return Err(DriftError::InvalidValue {
                    column: column.to_string(),
                    value: value.to_string(),
                })
            }
        }
    }
    Ok(values)
}
