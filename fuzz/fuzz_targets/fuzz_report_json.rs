// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
// Fuzz target for drift report decoding

#![no_main]

use driftwatch_core::DriftReport;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(report) = DriftReport::from_json(s) {
            // Anything accepted must be internally consistent and re-encodable
            assert_eq!(
                report.any_drift(),
                report.features().iter().any(|f| f.drift_detected)
            );
            if let Ok(json) = report.to_json() {
                let _ = DriftReport::from_json(&json);
            }
        }
    }
});
