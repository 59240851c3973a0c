// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Comparison and reference windows.
//!
//! Three calendar-day cut points exist per run: `beginning`, `mid` and
//! `now`. The comparison window is `[beginning, mid)` and the reference
//! window is `[mid, now]`. Records are assigned by comparing the
//! `YYYY-MM-DD` prefix of the datetime column as a string; dates are naive
//! and no timezone conversion happens.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dataset::{Dataset, Record, Value};
use crate::error::{DatasetSide, DriftError};

/// Date format of the datetime column and of the window bounds.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Default lookback horizon in days.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 14;

/// Default offset of the partition point before `now`, in days.
pub const DEFAULT_MID_OFFSET_DAYS: u32 = 7;

/// Longest accepted lookback, about a century.
pub const MAX_LOOKBACK_DAYS: u32 = 36_500;

/// Window sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSpec {
    /// Days between `beginning` and `now`.
    pub lookback_days: u32,
    /// Days between `mid` and `now`.
    pub mid_offset_days: u32,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            mid_offset_days: DEFAULT_MID_OFFSET_DAYS,
        }
    }
}

impl WindowSpec {
    /// Require `beginning < mid < now` and a lookback of at most
    /// [`MAX_LOOKBACK_DAYS`].
    pub fn validate(&self) -> Result<(), DriftError> {
        if self.mid_offset_days == 0 {
            return Err(DriftError::InvalidConfig(
                "mid_offset_days must be at least 1".to_string(),
            ));
        }
        if self.lookback_days <= self.mid_offset_days {
            return Err(DriftError::InvalidConfig(format!(
                "lookback_days ({}) must exceed mid_offset_days ({})",
                self.lookback_days, self.mid_offset_days
            )));
        }
        if self.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(DriftError::InvalidConfig(format!(
                "lookback_days ({}) must not exceed {}",
                self.lookback_days, MAX_LOOKBACK_DAYS
            )));
        }
        Ok(())
    }

    /// Cut points for a run happening on `now`.
    ///
    /// Offsets reaching past the earliest representable date saturate at
    /// [`NaiveDate::MIN`].
    pub fn at(&self, now: NaiveDate) -> Windows {
        let back = |days: u32| {
            now.checked_sub_signed(Duration::days(i64::from(days)))
                .unwrap_or(NaiveDate::MIN)
        };
        Windows {
            beginning: back(self.lookback_days),
            mid: back(self.mid_offset_days),
            now,
        }
    }
}

/// A date interval. `end` is exclusive unless `end_inclusive` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub end_inclusive: bool,
}

impl DateRange {
    /// Check a `YYYY-MM-DD` key against the range.
    pub fn contains_key(&self, key: &str) -> bool {
        KeyRange::from(*self).contains(key)
    }
}

/// A [`DateRange`] with its bounds rendered once, for matching many keys.
struct KeyRange {
    start: String,
    end: String,
    end_inclusive: bool,
}

impl From<DateRange> for KeyRange {
    fn from(range: DateRange) -> Self {
        Self {
            start: range.start.format(DATE_FORMAT).to_string(),
            end: range.end.format(DATE_FORMAT).to_string(),
            end_inclusive: range.end_inclusive,
        }
    }
}

impl KeyRange {
    fn contains(&self, key: &str) -> bool {
        key >= self.start.as_str()
            && if self.end_inclusive {
                key <= self.end.as_str()
            } else {
                key < self.end.as_str()
            }
    }
}

/// Cut points of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Windows {
    pub beginning: NaiveDate,
    pub mid: NaiveDate,
    pub now: NaiveDate,
}

/// Result of splitting a source dataset.
#[derive(Debug, Clone)]
pub struct Partition {
    pub comparison: Dataset,
    pub reference: Dataset,
    /// Records before `beginning`, after `now`, or without a date.
    pub out_of_range: usize,
}

impl Windows {
    /// `[beginning, mid)`
    pub fn comparison_range(&self) -> DateRange {
        DateRange {
            start: self.beginning,
            end: self.mid,
            end_inclusive: false,
        }
    }

    /// `[mid, now]`
    pub fn reference_range(&self) -> DateRange {
        DateRange {
            start: self.mid,
            end: self.now,
            end_inclusive: true,
        }
    }

    /// Split `data` into comparison and reference sets by its datetime column.
    ///
    /// Records with a missing date belong to neither window. A date cell
    /// that is present but not text fails with [`DriftError::InvalidValue`].
    pub fn partition(&self, data: &Dataset, datetime_column: &str) -> Result<Partition, DriftError> {
        if !data.has_column(datetime_column) {
            return Err(DriftError::missing(datetime_column, DatasetSide::Source));
        }

        // Validate every key up front so the filters below cannot fail.
        let mut undated = 0usize;
        for value in data.column(datetime_column) {
            if date_key(datetime_column, value)?.is_none() {
                undated += 1;
            }
        }
        if undated > 0 {
            warn!(
                column = datetime_column,
                records = undated,
                "records without a date are excluded from both windows"
            );
        }

        let comparison_range = KeyRange::from(self.comparison_range());
        let reference_range = KeyRange::from(self.reference_range());
        let in_range = |range: &KeyRange, record: &Record| {
            record_key(record, datetime_column).is_some_and(|key| range.contains(key))
        };

        let comparison = data.filter(|r| in_range(&comparison_range, r));
        let reference = data.filter(|r| in_range(&reference_range, r));
        let out_of_range = data.len() - comparison.len() - reference.len();

        debug!(
            comparison_rows = comparison.len(),
            reference_rows = reference.len(),
            out_of_range,
            "partitioned source dataset"
        );

        Ok(Partition {
            comparison,
            reference,
            out_of_range,
        })
    }
}

fn record_key<'a>(record: &'a Record, column: &str) -> Option<&'a str> {
    record
        .get(column)
        .and_then(|v| date_key(column, v).ok().flatten())
}

/// The `YYYY-MM-DD` prefix of a datetime cell, `None` when it is missing.
fn date_key<'a>(column: &str, value: &'a Value) -> Result<Option<&'a str>, DriftError> {
    match value {
        Value::Missing => Ok(None),
        Value::Text(text) => Ok(Some(text.get(..10).unwrap_or(text))),
        other => Err(DriftError::InvalidValue {
            column: column.to_string(),
            value: other.to_string(),
        }),
    }
}
