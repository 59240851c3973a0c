// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! End-to-end tests for the drift monitor

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use driftwatch_core::{DatasetSide, DriftError, DriftReport, Record, Value};
use driftwatch_monitor::{
    ChannelNotifier, Collaborator, DriftMonitor, InMemorySink, InMemorySource, MonitorConfig,
    MonitorError, ReportSink, RunStatus,
};

/// A sink that rejects every write.
struct FailingSink;

#[async_trait]
impl ReportSink for FailingSink {
    async fn write(&self, name: &str, _bytes: &[u8]) -> Result<(), MonitorError> {
        Err(MonitorError::Sink(format!("disk full writing {}", name)))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

fn now() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

fn config() -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.drift.numerical_features = vec!["f".to_string()];
    config.drift.categorical_features = vec!["channel".to_string()];
    config.notifier.topic = "drift-alerts".to_string();
    config
}

fn row(date: &str, f: f64, channel: &str) -> Record {
    let mut r = Record::new();
    r.insert("RecordDate".to_string(), Value::from(date));
    r.insert("f".to_string(), Value::from(f));
    r.insert("channel".to_string(), Value::from(channel));
    r.insert("target".to_string(), Value::from("yes"));
    r
}

/// Comparison window holds f = 10, reference window holds f = 1.
fn shifted_rows() -> Vec<Record> {
    vec![
        row("2024-03-02", 10.0, "web"),
        row("2024-03-04", 10.0, "web"),
        row("2024-03-06", 10.0, "web"),
        row("2024-03-09", 1.0, "web"),
        row("2024-03-12", 1.0, "web"),
        row("2024-03-15", 1.0, "web"),
    ]
}

#[tokio::test]
async fn test_drift_run_writes_reports_and_notifies() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config();
    config.report.output_dir = dir.path().to_path_buf();

    let (notifier, mut receiver) = ChannelNotifier::channel(4);
    let monitor = DriftMonitor::new(
        &config,
        Arc::new(InMemorySource::with_records(shifted_rows())),
        Arc::new(driftwatch_monitor::FsReportSink::new(dir.path())),
        Arc::new(notifier),
    )
    .unwrap();

    let outcome = monitor.run_at(now()).await.unwrap();
    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.comparison_rows, 3);
    assert_eq!(outcome.reference_rows, 3);
    assert!(outcome.notified);

    let report = &outcome.report;
    assert!(report.any_drift());
    assert_eq!(report.drifted_features(), vec!["f"]);
    let names: Vec<&str> = report.features().iter().map(|f| f.feature.as_str()).collect();
    assert_eq!(names, vec!["f", "channel", "target"]);

    let message = receiver.recv().await.unwrap();
    assert_eq!(message.topic, "drift-alerts");
    assert_eq!(&DriftReport::from_json(&message.body).unwrap(), report);
    assert!(receiver.try_recv().is_err());

    let written = std::fs::read_to_string(dir.path().join("drift_report.json")).unwrap();
    assert_eq!(&DriftReport::from_json(&written).unwrap(), report);
    let html = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
    assert!(html.contains("Drift detected"));
}

#[tokio::test]
async fn test_notification_failure_keeps_report_and_artifacts() {
    let sink = InMemorySink::new();
    let (notifier, receiver) = ChannelNotifier::channel(1);
    drop(receiver);

    let monitor = DriftMonitor::new(
        &config(),
        Arc::new(InMemorySource::with_records(shifted_rows())),
        Arc::new(sink.clone()),
        Arc::new(notifier),
    )
    .unwrap();

    let outcome = monitor.run_at(now()).await.unwrap();
    assert_eq!(outcome.status, RunStatus::CompletedWithFailures);
    assert!(outcome.report.any_drift());
    assert!(!outcome.notified);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].collaborator, Collaborator::Notifier);

    let json = sink.get_string("drift_report.json").await.unwrap();
    assert_eq!(DriftReport::from_json(&json).unwrap(), outcome.report);
    assert!(sink.get("index.html").await.is_some());
}

#[tokio::test]
async fn test_sink_failure_still_notifies() {
    let (notifier, mut receiver) = ChannelNotifier::channel(4);
    let monitor = DriftMonitor::new(
        &config(),
        Arc::new(InMemorySource::with_records(shifted_rows())),
        Arc::new(FailingSink),
        Arc::new(notifier),
    )
    .unwrap();

    let outcome = monitor.run_at(now()).await.unwrap();
    assert_eq!(outcome.status, RunStatus::CompletedWithFailures);
    assert!(outcome.notified);
    assert_eq!(outcome.failures.len(), 2);
    assert!(outcome
        .failures
        .iter()
        .all(|f| f.collaborator == Collaborator::Sink));
    let artifacts: Vec<&str> = outcome
        .failures
        .iter()
        .filter_map(|f| f.artifact.as_deref())
        .collect();
    assert_eq!(artifacts, vec!["drift_report.json", "index.html"]);
    assert!(receiver.recv().await.is_some());
}

#[tokio::test]
async fn test_missing_feature_aborts_without_side_effects() {
    let mut config = config();
    config.drift.numerical_features.push("income".to_string());

    let sink = InMemorySink::new();
    let (notifier, mut receiver) = ChannelNotifier::channel(1);
    let monitor = DriftMonitor::new(
        &config,
        Arc::new(InMemorySource::with_records(shifted_rows())),
        Arc::new(sink.clone()),
        Arc::new(notifier),
    )
    .unwrap();

    let err = monitor.run_at(now()).await.unwrap_err();
    match err {
        MonitorError::Drift(DriftError::SchemaMismatch { column, side }) => {
            assert_eq!(column, "income");
            assert_eq!(side, DatasetSide::Reference);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(sink.is_empty().await);
    assert!(receiver.try_recv().is_err());
}

#[tokio::test]
async fn test_unsupported_stattest_rejected_at_construction() {
    let mut config = config();
    config.drift.stattest = "anderson".to_string();

    let result = DriftMonitor::new(
        &config,
        Arc::new(InMemorySource::new()),
        Arc::new(InMemorySink::new()),
        Arc::new(driftwatch_monitor::LogNotifier),
    );
    assert!(matches!(
        result,
        Err(MonitorError::Drift(DriftError::UnsupportedTest { .. }))
    ));
}

#[tokio::test]
async fn test_empty_reference_window_reports_no_drift() {
    let rows: Vec<Record> = shifted_rows().into_iter().take(3).collect();
    let sink = InMemorySink::new();
    let (notifier, mut receiver) = ChannelNotifier::channel(1);
    let monitor = DriftMonitor::new(
        &config(),
        Arc::new(InMemorySource::with_records(rows)),
        Arc::new(sink.clone()),
        Arc::new(notifier),
    )
    .unwrap();

    let outcome = monitor.run_at(now()).await.unwrap();
    assert_eq!(outcome.reference_rows, 0);
    assert_eq!(outcome.report.len(), 3);
    assert!(outcome
        .report
        .features()
        .iter()
        .all(|f| !f.drift_detected && f.drift_score == 0.0));
    assert!(!outcome.notified);
    assert!(receiver.try_recv().is_err());
    assert!(sink.get("drift_report.json").await.is_some());
}

#[tokio::test]
async fn test_records_added_between_runs_are_picked_up() {
    let rows = shifted_rows();
    let source = InMemorySource::with_records(rows[..3].to_vec());
    let (notifier, mut receiver) = ChannelNotifier::channel(1);
    let monitor = DriftMonitor::new(
        &config(),
        Arc::new(source.clone()),
        Arc::new(InMemorySink::new()),
        Arc::new(notifier),
    )
    .unwrap();

    let first = monitor.run_at(now()).await.unwrap();
    assert_eq!(first.reference_rows, 0);
    assert!(!first.notified);

    for r in rows[3..].iter().cloned() {
        source.push(r).await;
    }
    let second = monitor.run_at(now()).await.unwrap();
    assert_eq!(second.reference_rows, 3);
    assert_eq!(second.report.drifted_features(), vec!["f"]);
    assert!(second.notified);
    assert!(receiver.try_recv().is_ok());
}

#[tokio::test]
async fn test_filters_apply_before_evaluation() {
    let mut rows = shifted_rows();
    // Records from another region would otherwise mask the shift.
    for date in ["2024-03-02", "2024-03-10"] {
        let mut r = row(date, 5.0, "web");
        r.insert("Region".to_string(), Value::from("us"));
        rows.push(r);
    }
    for r in rows.iter_mut() {
        r.entry("Region".to_string()).or_insert_with(|| Value::from("eu"));
    }

    let mut config = config();
    config
        .source
        .filters
        .insert("Region".to_string(), Value::from("eu"));
    let monitor = DriftMonitor::new(
        &config,
        Arc::new(InMemorySource::with_records(rows)),
        Arc::new(InMemorySink::new()),
        Arc::new(driftwatch_monitor::LogNotifier),
    )
    .unwrap();

    let outcome = monitor.run_at(now()).await.unwrap();
    assert_eq!(outcome.comparison_rows, 3);
    assert_eq!(outcome.reference_rows, 3);
}

#[tokio::test]
async fn test_from_config_reads_jsonl_and_writes_files() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("records.jsonl");
    let mut file = std::fs::File::create(&data_path).unwrap();
    for r in shifted_rows() {
        writeln!(file, "{}", serde_json::to_string(&r).unwrap()).unwrap();
    }
    // Too old to be fetched.
    writeln!(
        file,
        r#"{{"RecordDate": "2023-12-01", "f": 99, "channel": "store", "target": "no"}}"#
    )
    .unwrap();

    let out_dir = dir.path().join("reports");
    let json = format!(
        r#"{{
            "source": {{ "location": {location} }},
            "drift": {{ "numerical_features": ["f"], "categorical_features": ["channel"] }},
            "report": {{ "output_dir": {output} }}
        }}"#,
        location = serde_json::to_string(&data_path).unwrap(),
        output = serde_json::to_string(&out_dir).unwrap(),
    );
    let config = MonitorConfig::from_json(&json).unwrap();
    let monitor = DriftMonitor::from_config(&config).unwrap();

    let outcome = monitor.run_at(now()).await.unwrap();
    assert!(outcome.report.any_drift());
    assert_eq!(outcome.out_of_range_rows, 0);
    assert!(out_dir.join("drift_report.json").exists());
    assert!(out_dir.join("index.html").exists());
}
