// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Driftwatch Core
//!
//! Compares the distribution of monitored columns between two time windows
//! of the same dataset and reports, per column, whether it drifted.
//!
//! A run splits a source [`Dataset`] into an older comparison window and a
//! newer reference window ([`Windows`]), scores every feature of a
//! [`FeatureSet`] with a two-sample [`StatTest`], and aggregates the results
//! into a [`DriftReport`] whose JSON form carries one entry per feature plus
//! an `any_drift` flag.
//!
//! ```
//! use driftwatch_core::{DriftConfig, Dataset, Record, Value};
//! use chrono::NaiveDate;
//!
//! let config = DriftConfig {
//!     numerical_features: vec!["age".to_string()],
//!     ..Default::default()
//! };
//! let plan = config.validate().unwrap();
//!
//! let mut rows = Vec::new();
//! for (day, age) in [("2024-03-02", 30.0), ("2024-03-10", 60.0)] {
//!     let mut r = Record::new();
//!     r.insert("RecordDate".to_string(), Value::from(day));
//!     r.insert("age".to_string(), Value::from(age));
//!     r.insert("target".to_string(), Value::from("yes"));
//!     rows.push(r);
//! }
//! let source = Dataset::from_records(rows).unwrap();
//! let now = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
//! let evaluation = plan.evaluate_source(&source, now).unwrap();
//! assert!(evaluation.report.any_drift());
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluator;
pub mod features;
pub mod report;
pub mod stattest;
pub mod window;

pub use config::{DriftConfig, DriftPlan, Evaluation};
pub use dataset::{Dataset, Record, Value};
pub use error::{DatasetSide, DriftError};
pub use evaluator::{DriftEvaluator, DEFAULT_THRESHOLD};
pub use features::{FeatureKind, FeatureRole, FeatureSet, FeatureSpec, ANY_DRIFT_KEY};
pub use report::{aggregate, round_score, DriftReport, FeatureDriftResult};
pub use stattest::{FeatureSample, SampleStats, StatTest, TestSelection};
pub use window::{DateRange, Partition, WindowSpec, Windows};

/// Result type for drift evaluation.
pub type Result<T> = std::result::Result<T, DriftError>;
