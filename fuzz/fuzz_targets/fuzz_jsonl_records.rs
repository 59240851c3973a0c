// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
// Fuzz target for JSON Lines record parsing and windowing

#![no_main]

use chrono::NaiveDate;
use driftwatch_core::{Dataset, WindowSpec};
use driftwatch_monitor::parse_records;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // Malformed lines must surface as errors, never panics
        let Ok(records) = parse_records(text) else {
            return;
        };

        // Heterogeneous records are rejected rather than mixed into one schema
        if let Ok(dataset) = Dataset::from_records(records) {
            if let Some(now) = NaiveDate::from_ymd_opt(2024, 3, 15) {
                let windows = WindowSpec::default().at(now);
                let _ = windows.partition(&dataset, "RecordDate");
            }
        }
    }
});
