// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Drift report aggregation and its JSON form.
//!
//! The serialized report is a single object: one key per feature, in
//! evaluation order, each holding `drift_detected`, `stattest_name` and
//! `drift_score`, followed by the top-level `any_drift` flag.

use std::collections::HashSet;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::error::DriftError;
use crate::features::ANY_DRIFT_KEY;

/// Decimal places kept in reported scores.
pub const SCORE_DECIMALS: i32 = 4;

/// Outcome of one feature's test.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureDriftResult {
    pub feature: String,
    pub drift_detected: bool,
    pub stattest_name: String,
    pub drift_score: f64,
}

/// Wire form of a feature entry; the feature name is the map key.
#[derive(Serialize, Deserialize)]
struct FeatureEntry<S> {
    drift_detected: bool,
    stattest_name: S,
    drift_score: f64,
}

/// Per-feature results plus the overall flag.
///
/// Only [`aggregate`] and deserialization build a report, so `any_drift`
/// always equals the OR of the per-feature flags.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DriftReport {
    features: Vec<FeatureDriftResult>,
    any_drift: bool,
}

/// Round `score` to [`SCORE_DECIMALS`] places, halves away from zero.
///
/// Scores too large to scale are already integral and returned unchanged.
pub fn round_score(score: f64) -> f64 {
    let scale = 10f64.powi(SCORE_DECIMALS);
    let scaled = score * scale;
    if !scaled.is_finite() {
        return score;
    }
    scaled.round() / scale
}

/// Assemble per-feature results into a report.
///
/// Input order is kept (the evaluator emits covariates first and the target
/// last). A repeated feature name keeps its first occurrence. Scores are
/// rounded; `any_drift` is false for an empty input.
pub fn aggregate<I>(results: I) -> DriftReport
where
    I: IntoIterator<Item = FeatureDriftResult>,
{
    let mut seen = HashSet::new();
    let mut features = Vec::new();
    for mut result in results {
        if !seen.insert(result.feature.clone()) {
            debug!(feature = %result.feature, "dropping repeated feature result");
            continue;
        }
        result.drift_score = round_score(result.drift_score);
        features.push(result);
    }
    let any_drift = features.iter().any(|f| f.drift_detected);
    DriftReport {
        features,
        any_drift,
    }
}

impl DriftReport {
    pub fn any_drift(&self) -> bool {
        self.any_drift
    }

    pub fn features(&self) -> &[FeatureDriftResult] {
        &self.features
    }

    pub fn get(&self, feature: &str) -> Option<&FeatureDriftResult> {
        self.features.iter().find(|f| f.feature == feature)
    }

    /// Names of features flagged as drifted, in report order.
    pub fn drifted_features(&self) -> Vec<&str> {
        self.features
            .iter()
            .filter(|f| f.drift_detected)
            .map(|f| f.feature.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn to_json(&self) -> Result<String, DriftError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, DriftError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, DriftError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Serialize for DriftReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.features.len() + 1))?;
        for f in &self.features {
            map.serialize_entry(
                &f.feature,
                &FeatureEntry {
                    drift_detected: f.drift_detected,
                    stattest_name: f.stattest_name.as_str(),
                    drift_score: f.drift_score,
                },
            )?;
        }
        map.serialize_entry(ANY_DRIFT_KEY, &self.any_drift)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for DriftReport {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ReportVisitor)
    }
}

struct ReportVisitor;

impl<'de> Visitor<'de> for ReportVisitor {
    type Value = DriftReport;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a drift report object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<DriftReport, A::Error> {
        let mut features: Vec<FeatureDriftResult> = Vec::new();
        let mut any_drift = None;

        while let Some(key) = map.next_key::<String>()? {
            if key == ANY_DRIFT_KEY {
                if any_drift.is_some() {
                    return Err(de::Error::duplicate_field(ANY_DRIFT_KEY));
                }
                any_drift = Some(map.next_value::<bool>()?);
                continue;
            }
            if features.iter().any(|f| f.feature == key) {
                return Err(de::Error::custom(format!("duplicate feature '{}'", key)));
            }
            let entry: FeatureEntry<String> = map.next_value()?;
            features.push(FeatureDriftResult {
                feature: key,
                drift_detected: entry.drift_detected,
                stattest_name: entry.stattest_name,
                drift_score: entry.drift_score,
            });
        }

        let any_drift = any_drift.ok_or_else(|| de::Error::missing_field(ANY_DRIFT_KEY))?;
        if any_drift != features.iter().any(|f| f.drift_detected) {
            return Err(de::Error::custom(
                "any_drift disagrees with the per-feature drift flags",
            ));
        }
        Ok(DriftReport {
            features,
            any_drift,
        })
    }
}
