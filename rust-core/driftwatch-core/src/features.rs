// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Monitored columns.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DriftError;

/// Key reserved for the top-level flag of a serialized report.
pub const ANY_DRIFT_KEY: &str = "any_drift";

/// How a column's distribution is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    /// Binned histogram over numeric values.
    Numerical,
    /// Frequency table over observed categories.
    Categorical,
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKind::Numerical => write!(f, "numerical"),
            FeatureKind::Categorical => write!(f, "categorical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureRole {
    Covariate,
    Target,
}

/// One column to monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    pub kind: FeatureKind,
    pub role: FeatureRole,
}

impl FeatureSpec {
    pub fn numerical(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Numerical,
            role: FeatureRole::Covariate,
        }
    }

    pub fn categorical(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Categorical,
            role: FeatureRole::Covariate,
        }
    }

    pub fn target(name: impl Into<String>, kind: FeatureKind) -> Self {
        Self {
            name: name.into(),
            kind,
            role: FeatureRole::Target,
        }
    }
}

/// Ordered, owned set of monitored columns: covariates in the order they
/// were given, then the target.
///
/// Names are unique, at most one target exists, and no feature may be
/// called `any_drift`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeatureSet {
    features: Vec<FeatureSpec>,
}

impl FeatureSet {
    /// Validate and order `specs`. Covariates keep their relative order; the
    /// target, if any, is moved last.
    pub fn new(specs: Vec<FeatureSpec>) -> Result<Self, DriftError> {
        let mut seen = HashSet::new();
        for spec in &specs {
            if spec.name.is_empty() {
                return Err(DriftError::InvalidConfig(
                    "feature names must not be empty".to_string(),
                ));
            }
            if spec.name == ANY_DRIFT_KEY {
                return Err(DriftError::InvalidConfig(format!(
                    "'{}' is reserved and cannot name a feature",
                    ANY_DRIFT_KEY
                )));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(DriftError::InvalidConfig(format!(
                    "feature '{}' is declared more than once",
                    spec.name
                )));
            }
        }

        let (covariates, targets): (Vec<_>, Vec<_>) = specs
            .into_iter()
            .partition(|s| s.role == FeatureRole::Covariate);
        if targets.len() > 1 {
            return Err(DriftError::InvalidConfig(format!(
                "expected at most one target, got {}",
                targets.len()
            )));
        }

        let mut features = covariates;
        features.extend(targets);
        Ok(Self { features })
    }

    /// Numerical covariates, then categorical covariates, then the target.
    ///
    /// The inputs are only read; the set owns fresh copies of every name.
    pub fn from_names(
        numerical: &[String],
        categorical: &[String],
        target: Option<(&str, FeatureKind)>,
    ) -> Result<Self, DriftError> {
        let specs = numerical
            .iter()
            .map(|n| FeatureSpec::numerical(n.as_str()))
            .chain(categorical.iter().map(|n| FeatureSpec::categorical(n.as_str())))
            .chain(target.map(|(name, kind)| FeatureSpec::target(name, kind)))
            .collect();
        Self::new(specs)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureSpec> {
        self.features.iter()
    }

    pub fn target(&self) -> Option<&FeatureSpec> {
        self.features.iter().find(|f| f.role == FeatureRole::Target)
    }

    pub fn kinds(&self) -> HashSet<FeatureKind> {
        self.features.iter().map(|f| f.kind).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.features.iter().any(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
