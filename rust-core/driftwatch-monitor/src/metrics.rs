// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
// Prometheus metrics for drift runs.

use driftwatch_core::DriftReport;
use prometheus::{GaugeVec, IntCounter, IntCounterVec, Opts, Registry};

use crate::error::MonitorError;

/// Metric handles registered with a Prometheus registry.
#[derive(Clone)]
pub struct DriftMetrics {
    drift_score: GaugeVec,
    runs: IntCounter,
    drift_runs: IntCounter,
    collaborator_failures: IntCounterVec,
}

impl DriftMetrics {
    /// Create the metrics and register them with `registry`.
    pub fn register(registry: &Registry) -> Result<Self, MonitorError> {
        let drift_score = GaugeVec::new(
            Opts::new("driftwatch_drift_score", "Latest drift score per feature"),
            &["feature"],
        )?;
        let runs = IntCounter::new("driftwatch_runs_total", "Completed drift evaluations")?;
        let drift_runs = IntCounter::new(
            "driftwatch_drift_runs_total",
            "Drift evaluations where at least one feature drifted",
        )?;
        let collaborator_failures = IntCounterVec::new(
            Opts::new(
                "driftwatch_collaborator_failures_total",
                "Failed sink writes and notifications",
            ),
            &["collaborator"],
        )?;

        registry.register(Box::new(drift_score.clone()))?;
        registry.register(Box::new(runs.clone()))?;
        registry.register(Box::new(drift_runs.clone()))?;
        registry.register(Box::new(collaborator_failures.clone()))?;

        Ok(Self {
            drift_score,
            runs,
            drift_runs,
            collaborator_failures,
        })
    }

    /// Record a completed evaluation.
    pub fn observe_report(&self, report: &DriftReport) {
        self.runs.inc();
        if report.any_drift() {
            self.drift_runs.inc();
        }
        for f in report.features() {
            self.drift_score
                .with_label_values(&[f.feature.as_str()])
                .set(f.drift_score);
        }
    }

    pub fn observe_failure(&self, collaborator: &str) {
        self.collaborator_failures
            .with_label_values(&[collaborator])
            .inc();
    }
}
