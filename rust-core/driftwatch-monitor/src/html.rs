// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
// Static HTML rendering of a drift report.

use driftwatch_core::{DriftReport, Windows};

/// Escape text for HTML element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a self-contained page with one table row per feature.
pub fn render_html(report: &DriftReport, windows: &Windows) -> String {
    let status = if report.any_drift() {
        "Drift detected"
    } else {
        "No drift detected"
    };

    let rows: String = report
        .features()
        .iter()
        .map(|f| {
            format!(
                "      <tr class=\"{class}\"><td>{feature}</td><td>{test}</td><td>{score:.4}</td><td>{flag}</td></tr>\n",
                class = if f.drift_detected { "drift" } else { "stable" },
                feature = escape(&f.feature),
                test = escape(&f.stattest_name),
                score = f.drift_score,
                flag = if f.drift_detected { "yes" } else { "no" },
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Drift report {now}</title>
  <style>
    body {{ font-family: sans-serif; margin: 2rem; }}
    table {{ border-collapse: collapse; }}
    th, td {{ border: 1px solid #ccc; padding: 0.3rem 0.8rem; text-align: left; }}
    tr.drift td {{ background: #fde2e2; }}
  </style>
</head>
<body>
  <h1>{status}</h1>
  <p>Comparison window: {beginning} to {mid} (exclusive). Reference window: {mid} to {now} (inclusive).</p>
  <table>
    <thead>
      <tr><th>Feature</th><th>Test</th><th>Score</th><th>Drift</th></tr>
    </thead>
    <tbody>
{rows}    </tbody>
  </table>
</body>
</html>
"#,
        status = status,
        beginning = windows.beginning,
        mid = windows.mid,
        now = windows.now,
        rows = rows,
    )
}
