// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Driftwatch Monitor
//!
//! Runs a drift evaluation end to end: fetch records from a [`DataSource`],
//! evaluate them with `driftwatch-core`, write the JSON and HTML reports to
//! a [`ReportSink`], and publish through a [`Notifier`] when any feature
//! drifted.
//!
//! Evaluation errors abort the run before anything is written. Sink and
//! notifier failures are logged, counted and returned in the
//! [`RunOutcome`]; one failing collaborator never stops the others.

pub mod config;
pub mod error;
pub mod html;
pub mod metrics;
pub mod notifier;
pub mod sink;
pub mod source;

use std::fmt;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use driftwatch_core::{DriftPlan, DriftReport, Windows};
use prometheus::Registry;
use serde::Serialize;
use tracing::{error, info};

pub use config::{MonitorConfig, NotifierConfig, ReportConfig, SourceConfig};
pub use error::MonitorError;
pub use html::render_html;
pub use metrics::DriftMetrics;
pub use notifier::{ChannelNotifier, LogNotifier, NotificationMessage, Notifier};
pub use sink::{FsReportSink, InMemorySink, ReportSink};
pub use source::{parse_records, DataSource, InMemorySource, JsonLinesSource, RecordPredicate};

/// Collaborators whose failures are isolated from the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collaborator {
    Sink,
    Notifier,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collaborator::Sink => write!(f, "sink"),
            Collaborator::Notifier => write!(f, "notifier"),
        }
    }
}

/// A collaborator call that failed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollaboratorFailure {
    pub collaborator: Collaborator,
    /// Artifact name for sink failures.
    pub artifact: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Report computed, written and, if needed, published.
    Completed,
    /// Report computed but at least one collaborator failed.
    CompletedWithFailures,
}

/// Result of one monitor run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub report: DriftReport,
    pub windows: Windows,
    pub reference_rows: usize,
    pub comparison_rows: usize,
    pub out_of_range_rows: usize,
    /// True when the notification was delivered.
    pub notified: bool,
    pub failures: Vec<CollaboratorFailure>,
}

/// The drift monitoring pipeline.
pub struct DriftMonitor {
    plan: DriftPlan,
    predicate: RecordPredicate,
    report: ReportConfig,
    topic: String,
    source: Arc<dyn DataSource>,
    sink: Arc<dyn ReportSink>,
    notifier: Arc<dyn Notifier>,
    metrics: Option<DriftMetrics>,
}

impl DriftMonitor {
    /// Validate `config` and wire the collaborators.
    ///
    /// Configuration errors, including unsupported stattests, are returned
    /// here so that no run ever reaches the data source with a bad plan.
    pub fn new(
        config: &MonitorConfig,
        source: Arc<dyn DataSource>,
        sink: Arc<dyn ReportSink>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, MonitorError> {
        let plan = config.drift.validate()?;
        info!(
            features = plan.features.len(),
            target = plan.features.target().map(|t| t.name.as_str()).unwrap_or(""),
            numerical_stattest = %plan.evaluator.tests().numerical,
            categorical_stattest = %plan.evaluator.tests().categorical,
            threshold = plan.evaluator.threshold(),
            source = source.name(),
            sink = sink.name(),
            notifier = notifier.name(),
            "drift monitor configured"
        );
        Ok(Self {
            plan,
            predicate: RecordPredicate::from(config.source.filters.clone()),
            report: config.report.clone(),
            topic: config.notifier.topic.clone(),
            source,
            sink,
            notifier,
            metrics: None,
        })
    }

    /// Monitor reading JSON Lines from `source.location`, writing reports to
    /// `report.output_dir` and logging notifications.
    pub fn from_config(config: &MonitorConfig) -> Result<Self, MonitorError> {
        Self::new(
            config,
            Arc::new(JsonLinesSource::new(config.source.location.clone())),
            Arc::new(FsReportSink::new(config.report.output_dir.clone())),
            Arc::new(LogNotifier),
        )
    }

    /// Register Prometheus metrics
    pub fn with_prometheus(mut self, registry: &Registry) -> Result<Self, MonitorError> {
        self.metrics = Some(DriftMetrics::register(registry)?);
        Ok(self)
    }

    /// Run for today's local date.
    pub async fn run(&self) -> Result<RunOutcome, MonitorError> {
        self.run_at(Local::now().date_naive()).await
    }

    /// Run as if the current date were `now`.
    pub async fn run_at(&self, now: NaiveDate) -> Result<RunOutcome, MonitorError> {
        let windows = self.plan.windows(now);
        info!(
            beginning = %windows.beginning,
            mid = %windows.mid,
            now = %windows.now,
            "starting drift run"
        );

        let data = self
            .source
            .fetch(windows.beginning, &self.plan.datetime_column, &self.predicate)
            .await?;
        let evaluation = self.plan.evaluate_source(&data, now)?;
        let report = evaluation.report;

        if let Some(ref metrics) = self.metrics {
            metrics.observe_report(&report);
        }

        let report_json = report.to_json()?;
        let mut failures = Vec::new();

        let artifacts = [
            (self.report.json_name.as_str(), report.to_json_pretty()?),
            (self.report.html_name.as_str(), render_html(&report, &windows)),
        ];
        for (name, contents) in artifacts {
            if let Err(e) = self.sink.write(name, contents.as_bytes()).await {
                self.record_failure(&mut failures, Collaborator::Sink, Some(name), &e);
            }
        }

        let mut notified = false;
        if report.any_drift() {
            let message = NotificationMessage {
                topic: self.topic.clone(),
                body: report_json,
            };
            match self.notifier.publish(message).await {
                Ok(()) => notified = true,
                Err(e) => self.record_failure(&mut failures, Collaborator::Notifier, None, &e),
            }
        }

        let status = if failures.is_empty() {
            RunStatus::Completed
        } else {
            RunStatus::CompletedWithFailures
        };
        info!(
            any_drift = report.any_drift(),
            drifted = ?report.drifted_features(),
            notified,
            failures = failures.len(),
            "drift run finished"
        );

        Ok(RunOutcome {
            status,
            report,
            windows: evaluation.windows,
            reference_rows: evaluation.reference_rows,
            comparison_rows: evaluation.comparison_rows,
            out_of_range_rows: evaluation.out_of_range_rows,
            notified,
            failures,
        })
    }

    fn record_failure(
        &self,
        failures: &mut Vec<CollaboratorFailure>,
        collaborator: Collaborator,
        artifact: Option<&str>,
        err: &MonitorError,
    ) {
        error!(
            collaborator = %collaborator,
            artifact = artifact.unwrap_or(""),
            error = %err,
            "collaborator failed"
        );
        if let Some(ref metrics) = self.metrics {
            metrics.observe_failure(&collaborator.to_string());
        }
        failures.push(CollaboratorFailure {
            collaborator,
            artifact: artifact.map(str::to_string),
            message: err.to_string(),
        });
    }
}
