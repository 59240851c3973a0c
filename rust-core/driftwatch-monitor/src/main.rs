// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Driftwatch binary
//!
//! Runs one drift evaluation for today's date and prints the outcome as JSON.

use driftwatch_monitor::{DriftMonitor, MonitorConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json_logs = std::env::var("DRIFTWATCH_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = MonitorConfig::from_env()?;
    let monitor = DriftMonitor::from_config(&config)?;

    let outcome = monitor.run().await?;
    tracing::info!(status = ?outcome.status, any_drift = outcome.report.any_drift(), "run complete");

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
