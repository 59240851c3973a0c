// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
// Monitor configuration.
//
// Loaded from a JSON file named by `DRIFTWATCH_CONFIG` (default
// `driftwatch.json`). Every section and field has a default.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use driftwatch_core::{DriftConfig, Value};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::MonitorError;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "DRIFTWATCH_CONFIG";

/// Configuration file used when `DRIFTWATCH_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "driftwatch.json";

/// Complete monitor configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub source: SourceConfig,
    pub drift: DriftConfig,
    pub report: ReportConfig,
    pub notifier: NotifierConfig,
}

/// Where records come from and which of them to keep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// JSON Lines file holding the records.
    pub location: PathBuf,
    /// Column = value conditions; all must hold for a record to be kept.
    pub filters: BTreeMap<String, Value>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            location: PathBuf::from("data/records.jsonl"),
            filters: BTreeMap::new(),
        }
    }
}

/// Report artifact names and destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub html_name: String,
    pub json_name: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("reports"),
            html_name: "index.html".to_string(),
            json_name: "drift_report.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Topic drift notifications are published to.
    pub topic: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            topic: "drift-alerts".to_string(),
        }
    }
}

impl MonitorConfig {
    /// Parse a configuration document.
    pub fn from_json(json: &str) -> Result<Self, MonitorError> {
        serde_json::from_str(json).map_err(|e| MonitorError::Config(e.to_string()))
    }

    /// Read and parse the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MonitorError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MonitorError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config = Self::from_json(&contents)?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load from the file named by `DRIFTWATCH_CONFIG`, or `driftwatch.json`.
    pub fn from_env() -> Result<Self, MonitorError> {
        let path = match std::env::var(CONFIG_ENV) {
            Ok(val) if !val.is_empty() => PathBuf::from(val),
            _ => PathBuf::from(DEFAULT_CONFIG_PATH),
        };
        Self::load(path)
    }
}
