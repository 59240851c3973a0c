// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
// Data sources for drift runs.
//
// A `DataSource` returns every record dated on or after a start date that
// satisfies a `RecordPredicate`. Windowing happens later in the core.
// Two implementations exist: `JsonLinesSource` reads one JSON object per
// line from a file, `InMemorySource` holds records in process memory.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use driftwatch_core::window::DATE_FORMAT;
use driftwatch_core::{Dataset, Record, Value};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::MonitorError;

/// Equality conditions a record must all satisfy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPredicate {
    conditions: BTreeMap<String, Value>,
}

impl RecordPredicate {
    /// A predicate that keeps every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `column == value` condition.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.insert(column.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// A record lacking a condition column never matches.
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions
            .iter()
            .all(|(column, expected)| record.get(column) == Some(expected))
    }
}

impl From<BTreeMap<String, Value>> for RecordPredicate {
    fn from(conditions: BTreeMap<String, Value>) -> Self {
        Self { conditions }
    }
}

/// Supplier of raw records.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Records dated on or after `since` that satisfy `predicate`.
    ///
    /// Dates are read from the `YYYY-MM-DD` prefix of `datetime_column`.
    /// Records whose date cell is not text are kept, so that evaluation can
    /// report them.
    async fn fetch(
        &self,
        since: NaiveDate,
        datetime_column: &str,
        predicate: &RecordPredicate,
    ) -> Result<Dataset, MonitorError>;

    /// A human-readable name, used in logs.
    fn name(&self) -> &str;
}

/// Parse JSON Lines text into records. Blank lines are skipped.
pub fn parse_records(text: &str) -> Result<Vec<Record>, MonitorError> {
    let mut records = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: Record = serde_json::from_str(line)
            .map_err(|e| MonitorError::Source(format!("line {}: {}", idx + 1, e)))?;
        records.push(record);
    }
    Ok(records)
}

/// Apply the date and predicate filters and build a dataset.
///
/// The schema is the union of keys over all input records, including those
/// filtered out, so an empty selection still carries its columns. Absent
/// cells become [`Value::Missing`].
fn select(
    records: Vec<Record>,
    since: NaiveDate,
    datetime_column: &str,
    predicate: &RecordPredicate,
) -> Result<Dataset, MonitorError> {
    let columns: BTreeSet<String> = records.iter().flat_map(|r| r.keys().cloned()).collect();
    let since_key = since.format(DATE_FORMAT).to_string();
    let total = records.len();

    let mut dataset = Dataset::new(columns.iter().cloned().collect());
    for mut record in records {
        let recent = match record.get(datetime_column).and_then(Value::as_str) {
            Some(date) => date.get(..10).unwrap_or(date) >= since_key.as_str(),
            None => true,
        };
        if !recent || !predicate.matches(&record) {
            continue;
        }
        for column in &columns {
            record.entry(column.clone()).or_insert(Value::Missing);
        }
        dataset.push(record)?;
    }

    debug!(total, selected = dataset.len(), since = %since_key, "selected source records");
    Ok(dataset)
}

/// Records stored as JSON Lines in a local file.
#[derive(Debug, Clone)]
pub struct JsonLinesSource {
    path: PathBuf,
    name: String,
}

impl JsonLinesSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("jsonl:{}", path.display());
        Self { path, name }
    }
}

#[async_trait]
impl DataSource for JsonLinesSource {
    async fn fetch(
        &self,
        since: NaiveDate,
        datetime_column: &str,
        predicate: &RecordPredicate,
    ) -> Result<Dataset, MonitorError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| MonitorError::Source(format!("cannot read {}: {}", self.path.display(), e)))?;
        let records = parse_records(&text)?;
        select(records, since, datetime_column, predicate)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Records held in memory.
///
/// Clones share the same storage, so tests can keep a handle and add
/// records after the source was handed to a monitor.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Arc<RwLock<Vec<Record>>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub async fn push(&self, record: Record) {
        self.records.write().await.push(record);
    }
}

#[async_trait]
impl DataSource for InMemorySource {
    async fn fetch(
        &self,
        since: NaiveDate,
        datetime_column: &str,
        predicate: &RecordPredicate,
    ) -> Result<Dataset, MonitorError> {
        let records = self.records.read().await.clone();
        select(records, since, datetime_column, predicate)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
