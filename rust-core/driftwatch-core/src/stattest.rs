// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Two-sample distribution tests
//!
//! Every test returns a non-negative distance where larger means the two
//! samples differ more, so drift is always `score > threshold`. Numerical
//! samples are binned with the Sturges rule over the pooled values;
//! categorical samples become frequency tables over the union of observed
//! categories.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DriftError;
use crate::features::FeatureKind;

/// Substitute for empty bins in the log-ratio tests.
const EMPTY_BIN_PROPORTION: f64 = 0.0001;

/// Lower bound for the reference standard deviation used to norm Wasserstein.
const MIN_WASSERSTEIN_NORM: f64 = 0.001;

/// Supported statistical tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatTest {
    /// Population stability index.
    Psi,
    /// Kullback-Leibler divergence of reference from comparison.
    KlDiv,
    /// Jensen-Shannon distance (natural log).
    #[serde(rename = "jensenshannon")]
    JensenShannon,
    /// Hellinger distance, normed to `[0, 1]`.
    Hellinger,
    /// First Wasserstein distance normed by the reference standard deviation.
    Wasserstein,
}

impl StatTest {
    pub const ALL: [StatTest; 5] = [
        StatTest::Psi,
        StatTest::KlDiv,
        StatTest::JensenShannon,
        StatTest::Hellinger,
        StatTest::Wasserstein,
    ];

    /// Configuration identifier.
    pub fn id(self) -> &'static str {
        match self {
            StatTest::Psi => "psi",
            StatTest::KlDiv => "kl_div",
            StatTest::JensenShannon => "jensenshannon",
            StatTest::Hellinger => "hellinger",
            StatTest::Wasserstein => "wasserstein",
        }
    }

    /// Name written to `stattest_name` in reports.
    pub fn display_name(self) -> &'static str {
        match self {
            StatTest::Psi => "PSI",
            StatTest::KlDiv => "Kullback-Leibler divergence",
            StatTest::JensenShannon => "Jensen-Shannon distance",
            StatTest::Hellinger => "Hellinger distance (normed)",
            StatTest::Wasserstein => "Wasserstein distance (normed)",
        }
    }

    pub fn supports(self, kind: FeatureKind) -> bool {
        match self {
            StatTest::Wasserstein => kind == FeatureKind::Numerical,
            _ => true,
        }
    }

    /// Parse an identifier and check it against `kind`.
    pub fn for_kind(name: &str, kind: FeatureKind) -> Result<Self, DriftError> {
        let test: StatTest = name.parse()?;
        if !test.supports(kind) {
            return Err(DriftError::UnsupportedTest {
                name: name.to_string(),
                reason: format!("not applicable to {} features", kind),
            });
        }
        Ok(test)
    }

    /// Distance between the reference and comparison sides of `sample`.
    ///
    /// Always finite and non-negative: overflowing distances saturate at
    /// `f64::MAX` so reports stay representable in JSON.
    pub fn score(self, sample: &FeatureSample) -> Result<f64, DriftError> {
        let score = match self {
            StatTest::Wasserstein => match sample {
                FeatureSample::Numerical {
                    reference,
                    comparison,
                } => wasserstein_normed(reference, comparison),
                FeatureSample::Categorical { .. } => {
                    return Err(DriftError::UnsupportedTest {
                        name: self.id().to_string(),
                        reason: format!("not applicable to {} features", sample.kind()),
                    })
                }
            },
            StatTest::Psi => {
                let (r, c) = sample.proportions();
                psi(&r, &c)
            }
            StatTest::KlDiv => {
                let (r, c) = sample.proportions();
                kl_divergence(&r, &c)
            }
            StatTest::JensenShannon => {
                let (r, c) = sample.proportions();
                jensen_shannon(&r, &c)
            }
            StatTest::Hellinger => {
                let (r, c) = sample.proportions();
                hellinger(&r, &c)
            }
        };
        let score = score.max(0.0);
        Ok(if score.is_finite() { score } else { f64::MAX })
    }
}

impl fmt::Display for StatTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for StatTest {
    type Err = DriftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "psi" => Ok(StatTest::Psi),
            "kl_div" => Ok(StatTest::KlDiv),
            "jensenshannon" | "js" => Ok(StatTest::JensenShannon),
            "hellinger" => Ok(StatTest::Hellinger),
            "wasserstein" => Ok(StatTest::Wasserstein),
            _ => Err(DriftError::UnsupportedTest {
                name: s.to_string(),
                reason: format!(
                    "unknown identifier (expected one of: {})",
                    StatTest::ALL.map(StatTest::id).join(", ")
                ),
            }),
        }
    }
}

/// Per-kind test choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSelection {
    pub numerical: StatTest,
    pub categorical: StatTest,
}

impl TestSelection {
    /// Same test for both kinds. Fails if the test cannot handle one of them.
    pub fn uniform(test: StatTest) -> Result<Self, DriftError> {
        Self::new(test, test)
    }

    pub fn new(numerical: StatTest, categorical: StatTest) -> Result<Self, DriftError> {
        if !categorical.supports(FeatureKind::Categorical) {
            return Err(DriftError::UnsupportedTest {
                name: categorical.id().to_string(),
                reason: "not applicable to categorical features".to_string(),
            });
        }
        Ok(Self {
            numerical,
            categorical,
        })
    }

    pub fn for_kind(&self, kind: FeatureKind) -> StatTest {
        match kind {
            FeatureKind::Numerical => self.numerical,
            FeatureKind::Categorical => self.categorical,
        }
    }
}

impl Default for TestSelection {
    fn default() -> Self {
        Self {
            numerical: StatTest::Psi,
            categorical: StatTest::Psi,
        }
    }
}

/// Non-missing values of one feature in both windows.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureSample {
    Numerical {
        reference: Vec<f64>,
        comparison: Vec<f64>,
    },
    Categorical {
        reference: Vec<String>,
        comparison: Vec<String>,
    },
}

impl FeatureSample {
    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureSample::Numerical { .. } => FeatureKind::Numerical,
            FeatureSample::Categorical { .. } => FeatureKind::Categorical,
        }
    }

    /// True when either side has no values.
    pub fn has_empty_side(&self) -> bool {
        match self {
            FeatureSample::Numerical {
                reference,
                comparison,
            } => reference.is_empty() || comparison.is_empty(),
            FeatureSample::Categorical {
                reference,
                comparison,
            } => reference.is_empty() || comparison.is_empty(),
        }
    }

    /// True when both sides hold one and the same value.
    pub fn is_constant(&self) -> bool {
        match self {
            FeatureSample::Numerical {
                reference,
                comparison,
            } => {
                let stats = SampleStats::compute(reference.iter().chain(comparison.iter()).copied());
                stats.count > 0 && stats.min == stats.max
            }
            FeatureSample::Categorical {
                reference,
                comparison,
            } => match reference.first().or_else(|| comparison.first()) {
                Some(first) => reference.iter().chain(comparison.iter()).all(|v| v == first),
                None => false,
            },
        }
    }

    /// Aligned bin proportions for reference and comparison.
    pub fn proportions(&self) -> (Vec<f64>, Vec<f64>) {
        match self {
            FeatureSample::Numerical {
                reference,
                comparison,
            } => histogram(reference, comparison),
            FeatureSample::Categorical {
                reference,
                comparison,
            } => frequency_table(reference, comparison),
        }
    }
}

/// Summary statistics of a numeric sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStats {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl SampleStats {
    /// Population statistics over finite values.
    pub fn compute<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let valid: Vec<f64> = values.into_iter().filter(|x| x.is_finite()).collect();
        if valid.is_empty() {
            return Self {
                count: 0,
                mean: 0.0,
                std_dev: 0.0,
                min: 0.0,
                max: 0.0,
            };
        }

        let count = valid.len();
        let mean = valid.iter().sum::<f64>() / count as f64;
        let variance = valid.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count as f64;
        let min = valid.iter().copied().fold(f64::INFINITY, f64::min);
        let max = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Self {
            count,
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
        }
    }
}

/// Number of equal-width bins for `n` pooled values.
pub fn sturges_bins(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    ((n as f64).log2() + 1.0).ceil() as usize
}

/// Proportions per bin of equal-width bins spanning the pooled range.
fn histogram(reference: &[f64], comparison: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let pooled = SampleStats::compute(reference.iter().chain(comparison.iter()).copied());
    let bins = if pooled.max > pooled.min {
        sturges_bins(pooled.count)
    } else {
        1
    };
    let width = (pooled.max - pooled.min) / bins as f64;

    let count = |values: &[f64]| {
        let mut counts = vec![0usize; bins];
        for &v in values {
            let idx = if width > 0.0 {
                (((v - pooled.min) / width) as usize).min(bins - 1)
            } else {
                0
            };
            counts[idx] += 1;
        }
        to_proportions(&counts, values.len())
    };

    (count(reference), count(comparison))
}

/// Proportions per category over the union of both sides, categories sorted.
fn frequency_table(reference: &[String], comparison: &[String]) -> (Vec<f64>, Vec<f64>) {
    let mut table: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for v in reference {
        table.entry(v.as_str()).or_default().0 += 1;
    }
    for v in comparison {
        table.entry(v.as_str()).or_default().1 += 1;
    }
    let ref_counts: Vec<usize> = table.values().map(|(r, _)| *r).collect();
    let cmp_counts: Vec<usize> = table.values().map(|(_, c)| *c).collect();
    (
        to_proportions(&ref_counts, reference.len()),
        to_proportions(&cmp_counts, comparison.len()),
    )
}

fn to_proportions(counts: &[usize], total: usize) -> Vec<f64> {
    if total == 0 {
        return vec![0.0; counts.len()];
    }
    counts.iter().map(|&c| c as f64 / total as f64).collect()
}

fn fill_empty_bins(p: &[f64]) -> Vec<f64> {
    p.iter()
        .map(|&x| if x == 0.0 { EMPTY_BIN_PROPORTION } else { x })
        .collect()
}

fn psi(reference: &[f64], comparison: &[f64]) -> f64 {
    let r = fill_empty_bins(reference);
    let c = fill_empty_bins(comparison);
    r.iter()
        .zip(c.iter())
        .map(|(r, c)| (r - c) * (r / c).ln())
        .sum()
}

fn kl_divergence(reference: &[f64], comparison: &[f64]) -> f64 {
    let normalise = |p: Vec<f64>| {
        let total: f64 = p.iter().sum();
        p.into_iter().map(|x| x / total).collect::<Vec<_>>()
    };
    let r = normalise(fill_empty_bins(reference));
    let c = normalise(fill_empty_bins(comparison));
    r.iter().zip(c.iter()).map(|(r, c)| r * (r / c).ln()).sum()
}

fn jensen_shannon(reference: &[f64], comparison: &[f64]) -> f64 {
    let term = |p: f64, m: f64| if p > 0.0 { p * (p / m).ln() } else { 0.0 };
    let divergence: f64 = reference
        .iter()
        .zip(comparison.iter())
        .map(|(&r, &c)| {
            let m = (r + c) / 2.0;
            0.5 * term(r, m) + 0.5 * term(c, m)
        })
        .sum();
    divergence.max(0.0).sqrt()
}

fn hellinger(reference: &[f64], comparison: &[f64]) -> f64 {
    let sum: f64 = reference
        .iter()
        .zip(comparison.iter())
        .map(|(r, c)| (r.sqrt() - c.sqrt()).powi(2))
        .sum();
    sum.sqrt() / std::f64::consts::SQRT_2
}

/// Area between the two empirical CDFs, divided by the reference spread.
fn wasserstein_normed(reference: &[f64], comparison: &[f64]) -> f64 {
    if reference.is_empty() || comparison.is_empty() {
        return 0.0;
    }
    let sorted = |values: &[f64]| {
        let mut v = values.to_vec();
        v.sort_by(|a, b| a.total_cmp(b));
        v
    };
    let r = sorted(reference);
    let c = sorted(comparison);
    let mut all: Vec<f64> = r.iter().chain(c.iter()).copied().collect();
    all.sort_by(|a, b| a.total_cmp(b));

    let cdf = |values: &[f64], x: f64| values.partition_point(|v| *v <= x) as f64 / values.len() as f64;
    let distance: f64 = all
        .windows(2)
        .map(|w| {
            let gap = (cdf(&r, w[0]) - cdf(&c, w[0])).abs();
            if gap == 0.0 {
                0.0
            } else {
                gap * (w[1] - w[0])
            }
        })
        .sum();

    let norm = SampleStats::compute(reference.iter().copied())
        .std_dev
        .max(MIN_WASSERSTEIN_NORM);
    distance / norm
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numerical(reference: &[f64], comparison: &[f64]) -> FeatureSample {
        FeatureSample::Numerical {
            reference: reference.to_vec(),
            comparison: comparison.to_vec(),
        }
    }

    fn categorical(reference: &[&str], comparison: &[&str]) -> FeatureSample {
        FeatureSample::Categorical {
            reference: reference.iter().map(|s| s.to_string()).collect(),
            comparison: comparison.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_identifiers() {
        assert_eq!("psi".parse::<StatTest>().unwrap(), StatTest::Psi);
        assert_eq!(" PSI ".parse::<StatTest>().unwrap(), StatTest::Psi);
        assert_eq!("js".parse::<StatTest>().unwrap(), StatTest::JensenShannon);
        for test in StatTest::ALL {
            assert_eq!(test.id().parse::<StatTest>().unwrap(), test);
        }
        let err = "chisquare".parse::<StatTest>().unwrap_err();
        assert!(matches!(err, DriftError::UnsupportedTest { .. }));
    }

    #[test]
    fn test_wasserstein_rejects_categorical() {
        assert!(StatTest::for_kind("wasserstein", FeatureKind::Numerical).is_ok());
        assert!(matches!(
            StatTest::for_kind("wasserstein", FeatureKind::Categorical),
            Err(DriftError::UnsupportedTest { .. })
        ));
        assert!(TestSelection::uniform(StatTest::Wasserstein).is_err());
        assert!(TestSelection::new(StatTest::Wasserstein, StatTest::Psi).is_ok());
        assert!(StatTest::Wasserstein
            .score(&categorical(&["a"], &["b"]))
            .is_err());
    }

    #[test]
    fn test_sturges_bins() {
        assert_eq!(sturges_bins(0), 1);
        assert_eq!(sturges_bins(1), 1);
        assert_eq!(sturges_bins(2), 2);
        assert_eq!(sturges_bins(6), 4);
        assert_eq!(sturges_bins(1000), 11);
    }

    #[test]
    fn test_histogram_puts_max_in_last_bin() {
        let (r, c) = histogram(&[1.0, 1.0, 1.0], &[10.0, 10.0, 10.0]);
        assert_eq!(r, vec![1.0, 0.0, 0.0, 0.0]);
        assert_eq!(c, vec![0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_frequency_table_zero_fills_missing_categories() {
        let (r, c) = frequency_table(
            &["a".to_string(), "a".to_string(), "b".to_string(), "b".to_string()],
            &["b".to_string(), "c".to_string()],
        );
        assert_eq!(r, vec![0.5, 0.5, 0.0]);
        assert_eq!(c, vec![0.0, 0.5, 0.5]);
    }

    #[test]
    fn test_identical_samples_score_zero() {
        let sample = numerical(&[1.0, 2.0, 3.0, 4.0, 5.0], &[1.0, 2.0, 3.0, 4.0, 5.0]);
        for test in StatTest::ALL {
            let score = test.score(&sample).unwrap();
            assert!(score.abs() < 1e-12, "{} gave {}", test, score);
        }
    }

    #[test]
    fn test_psi_disjoint_samples() {
        let sample = numerical(&[1.0, 1.0, 1.0], &[10.0, 10.0, 10.0]);
        let score = StatTest::Psi.score(&sample).unwrap();
        let expected = 2.0 * (1.0 - EMPTY_BIN_PROPORTION) * (1.0 / EMPTY_BIN_PROPORTION).ln();
        assert!((score - expected).abs() < 1e-9, "got {}", score);
    }

    #[test]
    fn test_psi_categorical_matches_hand_computation() {
        let sample = categorical(&["a", "a", "b", "b"], &["a", "b", "b", "b"]);
        let score = StatTest::Psi.score(&sample).unwrap();
        let expected = (0.5 - 0.25) * (0.5f64 / 0.25).ln() + (0.5 - 0.75) * (0.5f64 / 0.75).ln();
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_bounded_distances() {
        let sample = categorical(&["a", "a"], &["b", "b"]);
        let hellinger = StatTest::Hellinger.score(&sample).unwrap();
        assert!((hellinger - 1.0).abs() < 1e-12);
        let js = StatTest::JensenShannon.score(&sample).unwrap();
        assert!((js - std::f64::consts::LN_2.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_kl_divergence_is_positive_for_shift() {
        let sample = categorical(&["a", "a", "a", "b"], &["a", "b", "b", "b"]);
        assert!(StatTest::KlDiv.score(&sample).unwrap() > 0.1);
    }

    #[test]
    fn test_wasserstein_shift_in_std_units() {
        // Reference std is 1.0, comparison is shifted by 2.0.
        let reference = [-1.0, 1.0, -1.0, 1.0];
        let comparison = [1.0, 3.0, 1.0, 3.0];
        let score = StatTest::Wasserstein
            .score(&numerical(&reference, &comparison))
            .unwrap();
        assert!((score - 2.0).abs() < 1e-12, "got {}", score);
    }

    #[test]
    fn test_wasserstein_constant_reference_uses_floor() {
        let score = StatTest::Wasserstein
            .score(&numerical(&[5.0, 5.0], &[5.001, 5.001]))
            .unwrap();
        assert!((score - 1.0).abs() < 1e-6, "got {}", score);
    }

    #[test]
    fn test_overflowing_distance_saturates() {
        let far = numerical(&[0.0, 0.0], &[1e306, 1e306]);
        assert_eq!(StatTest::Wasserstein.score(&far).unwrap(), f64::MAX);

        let extremes = numerical(&[-f64::MAX, 0.0], &[f64::MAX, f64::MAX]);
        for test in StatTest::ALL {
            let score = test.score(&extremes).unwrap();
            assert!(score.is_finite() && score >= 0.0, "{test} scored {score}");
        }
    }

    #[test]
    fn test_constant_detection() {
        assert!(numerical(&[3.0, 3.0], &[3.0]).is_constant());
        assert!(!numerical(&[3.0], &[4.0]).is_constant());
        assert!(categorical(&["x"], &["x", "x"]).is_constant());
        assert!(!categorical(&["x"], &["y"]).is_constant());
        assert!(!numerical(&[], &[]).is_constant());
    }

    #[test]
    fn test_sample_stats() {
        let stats = SampleStats::compute([1.0, 2.0, 3.0, 4.0, 5.0, f64::NAN]);
        assert_eq!(stats.count, 5);
        assert!((stats.mean - 3.0).abs() < 1e-12);
        assert!((stats.std_dev - 2.0f64.sqrt()).abs() < 1e-12);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
    }
}
