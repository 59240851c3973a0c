// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Tabular records and datasets.
//!
//! A record is a JSON object mapping column names to cells. A [`Dataset`]
//! keeps an explicit column list next to its records so that an empty
//! window still has a schema that can be validated.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DriftError;

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing cell (`null`).
    Missing,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    /// Numeric reading of the cell.
    ///
    /// Text that parses as a float counts as numeric, since row-oriented
    /// sources frequently hand back every cell as a string.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Bool(_) | Value::Missing => None,
        }
    }

    /// Category key used by frequency tables. `None` for missing cells.
    pub fn category(&self) -> Option<String> {
        match self {
            Value::Missing => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Text(s) => Some(s.clone()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// One row: column name to cell.
pub type Record = BTreeMap<String, Value>;

/// An ordered collection of records sharing one column set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    /// Create an empty dataset with a known schema.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    /// Build a dataset whose schema is taken from the first record.
    ///
    /// An empty input yields a dataset with no columns.
    pub fn from_records(records: Vec<Record>) -> Result<Self, DriftError> {
        let columns = records
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default();
        Self::with_records(columns, records)
    }

    /// Build a dataset with an explicit schema, checking every record against it.
    pub fn with_records(columns: Vec<String>, records: Vec<Record>) -> Result<Self, DriftError> {
        let mut dataset = Self::new(columns);
        dataset.records.reserve(records.len());
        for record in records {
            dataset.push(record)?;
        }
        Ok(dataset)
    }

    /// Append a record. Its keys must equal the dataset's column set.
    pub fn push(&mut self, record: Record) -> Result<(), DriftError> {
        if record.len() != self.columns.len()
            || !self.columns.iter().all(|c| record.contains_key(c))
        {
            let expected: BTreeSet<&str> = self.columns.iter().map(String::as_str).collect();
            let found: BTreeSet<&str> = record.keys().map(String::as_str).collect();
            return Err(DriftError::InvalidRecord(format!(
                "record {} has columns {:?}, expected {:?}",
                self.records.len(),
                found,
                expected
            )));
        }
        self.records.push(record);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Cells of one column, in record order.
    pub fn column<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.records.iter().filter_map(move |r| r.get(name))
    }

    /// New dataset with the same schema holding the records that satisfy `keep`.
    pub fn filter<F>(&self, mut keep: F) -> Dataset
    where
        F: FnMut(&Record) -> bool,
    {
        Dataset {
            columns: self.columns.clone(),
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}
