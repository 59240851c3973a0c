// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Drift configuration and its validated form.
//!
//! Defaults:
//! - datetime column: `RecordDate`
//! - stattest: `psi` for both feature kinds
//! - threshold: 0.15
//! - windows: 14 day lookback, partition 7 days before now
//! - target kind: categorical

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::Dataset;
use crate::error::DriftError;
use crate::evaluator::{DriftEvaluator, DEFAULT_THRESHOLD};
use crate::features::{FeatureKind, FeatureSet};
use crate::report::{aggregate, DriftReport};
use crate::stattest::{StatTest, TestSelection};
use crate::window::{WindowSpec, Windows};

/// Default name of the column used to partition records.
pub const DEFAULT_DATETIME_COLUMN: &str = "RecordDate";

/// Default stattest identifier.
pub const DEFAULT_STATTEST: &str = "psi";

/// User-facing drift configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    /// Target column, evaluated after all covariates.
    pub target: String,
    pub target_kind: FeatureKind,
    /// Numerical covariates, in report order.
    pub numerical_features: Vec<String>,
    /// Categorical covariates, in report order after the numerical ones.
    pub categorical_features: Vec<String>,
    /// Column holding `YYYY-MM-DD` dates.
    pub datetime_column: String,
    /// Test applied to both kinds unless overridden below.
    pub stattest: String,
    pub numerical_stattest: Option<String>,
    pub categorical_stattest: Option<String>,
    /// Drift is flagged when a score is strictly greater than this.
    pub threshold: f64,
    pub window: WindowSpec,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            target: "target".to_string(),
            target_kind: FeatureKind::Categorical,
            numerical_features: Vec::new(),
            categorical_features: Vec::new(),
            datetime_column: DEFAULT_DATETIME_COLUMN.to_string(),
            stattest: DEFAULT_STATTEST.to_string(),
            numerical_stattest: None,
            categorical_stattest: None,
            threshold: DEFAULT_THRESHOLD,
            window: WindowSpec::default(),
        }
    }
}

impl DriftConfig {
    /// Check the configuration and build an executable plan.
    ///
    /// Unknown or kind-incompatible test identifiers fail here with
    /// [`DriftError::UnsupportedTest`], before any data is touched.
    pub fn validate(&self) -> Result<DriftPlan, DriftError> {
        if self.target.is_empty() {
            return Err(DriftError::InvalidConfig("target must be set".to_string()));
        }
        if self.datetime_column.is_empty() {
            return Err(DriftError::InvalidConfig(
                "datetime_column must be set".to_string(),
            ));
        }
        self.window.validate()?;

        let features = FeatureSet::from_names(
            &self.numerical_features,
            &self.categorical_features,
            Some((self.target.as_str(), self.target_kind)),
        )?;
        if features.contains(&self.datetime_column) {
            return Err(DriftError::InvalidConfig(format!(
                "datetime column '{}' cannot also be a feature",
                self.datetime_column
            )));
        }

        let kinds = features.kinds();
        let resolve = |kind: FeatureKind, override_name: &Option<String>| -> Result<StatTest, DriftError> {
            let name = override_name.as_deref().unwrap_or(&self.stattest);
            if kinds.contains(&kind) {
                StatTest::for_kind(name, kind)
            } else {
                // Still reject unknown identifiers for kinds with no features.
                let test: StatTest = name.parse()?;
                Ok(if test.supports(kind) { test } else { StatTest::Psi })
            }
        };
        let tests = TestSelection::new(
            resolve(FeatureKind::Numerical, &self.numerical_stattest)?,
            resolve(FeatureKind::Categorical, &self.categorical_stattest)?,
        )?;
        let evaluator = DriftEvaluator::new(tests, self.threshold)?;

        Ok(DriftPlan {
            features,
            evaluator,
            window: self.window,
            datetime_column: self.datetime_column.clone(),
        })
    }
}

/// A validated configuration, ready to evaluate source data.
#[derive(Debug, Clone)]
pub struct DriftPlan {
    pub features: FeatureSet,
    pub evaluator: DriftEvaluator,
    pub window: WindowSpec,
    pub datetime_column: String,
}

/// Everything one evaluation produced.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub windows: Windows,
    pub report: DriftReport,
    pub reference_rows: usize,
    pub comparison_rows: usize,
    pub out_of_range_rows: usize,
}

impl DriftPlan {
    /// Cut points for a run on `now`.
    pub fn windows(&self, now: NaiveDate) -> Windows {
        self.window.at(now)
    }

    /// Partition `source`, evaluate every feature and aggregate the report.
    pub fn evaluate_source(&self, source: &Dataset, now: NaiveDate) -> Result<Evaluation, DriftError> {
        let windows = self.windows(now);
        let partition = windows.partition(source, &self.datetime_column)?;
        let results = self
            .evaluator
            .evaluate(&partition.reference, &partition.comparison, &self.features)?;
        let report = aggregate(results);

        info!(
            beginning = %windows.beginning,
            mid = %windows.mid,
            now = %windows.now,
            reference_rows = partition.reference.len(),
            comparison_rows = partition.comparison.len(),
            features = report.len(),
            any_drift = report.any_drift(),
            "drift evaluation complete"
        );

        Ok(Evaluation {
            windows,
            reference_rows: partition.reference.len(),
            comparison_rows: partition.comparison.len(),
            out_of_range_rows: partition.out_of_range,
            report,
        })
    }
}
