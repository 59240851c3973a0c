// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
// Report sinks.
//
// A sink stores named report artifacts. `FsReportSink` writes files into a
// directory; `InMemorySink` keeps them in a shared `BTreeMap`.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::MonitorError;

/// Destination for report artifacts.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Store `bytes` under `name`, replacing any previous artifact.
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), MonitorError>;

    fn name(&self) -> &str;
}

/// Writes artifacts as files in one directory.
#[derive(Debug, Clone)]
pub struct FsReportSink {
    dir: PathBuf,
}

impl FsReportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

/// Artifact names are single path components.
fn check_name(name: &str) -> Result<(), MonitorError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(MonitorError::Sink(format!("invalid artifact name '{}'", name))),
    }
}

#[async_trait]
impl ReportSink for FsReportSink {
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), MonitorError> {
        check_name(name)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| MonitorError::Sink(format!("cannot create {}: {}", self.dir.display(), e)))?;
        let path = self.dir.join(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| MonitorError::Sink(format!("cannot write {}: {}", path.display(), e)))?;
        debug!(path = %path.display(), bytes = bytes.len(), "wrote report artifact");
        Ok(())
    }

    fn name(&self) -> &str {
        "fs"
    }
}

/// Keeps artifacts in memory. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct InMemorySink {
    artifacts: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.artifacts.read().await.get(name).cloned()
    }

    /// Artifact decoded as UTF-8, if present and valid.
    pub async fn get_string(&self, name: &str) -> Option<String> {
        self.get(name).await.and_then(|b| String::from_utf8(b).ok())
    }

    pub async fn names(&self) -> Vec<String> {
        self.artifacts.read().await.keys().cloned().collect()
    }

    pub async fn is_empty(&self) -> bool {
        self.artifacts.read().await.is_empty()
    }
}

#[async_trait]
impl ReportSink for InMemorySink {
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), MonitorError> {
        check_name(name)?;
        self.artifacts
            .write()
            .await
            .insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
