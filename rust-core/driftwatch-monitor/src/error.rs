// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
// Error types for the drift monitor.
//
// Core evaluation failures are wrapped unchanged. Collaborator failures
// (source, sink, notifier) carry the collaborator's own message.

use driftwatch_core::DriftError;
use thiserror::Error;

/// Errors raised by the monitor and its collaborators.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Evaluation failed; no report exists for the run.
    #[error(transparent)]
    Drift(#[from] DriftError),

    /// The data source could not be read.
    #[error("data source error: {0}")]
    Source(String),

    /// Publishing the drift notification failed.
    #[error("notification failed: {0}")]
    Notification(String),

    /// Writing a report artifact failed.
    #[error("report sink error: {0}")]
    Sink(String),

    /// The monitor configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// Metric registration failed.
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
