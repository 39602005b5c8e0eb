// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Rolling query transcript side-channel.
//!
//! Records one structured line per protocol call (query sent, response
//! received or absent, success flag) to a JSON-lines artifact bounded by
//! file size and retained-file count. The logger never participates in a
//! call's outcome: records are handed off fire-and-forget to a background
//! task, and a write failure only warns.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

/// One protocol-call transcript record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRecord {
    /// When the call completed.
    pub timestamp: DateTime<Utc>,
    /// Hostname of the target server.
    pub server: String,
    /// Wire name of the operation.
    pub operation: String,
    /// Object-type tag, when the operation carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    /// The outbound query document.
    pub query: String,
    /// The inbound response body; `None` when the call never answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Whether the call succeeded.
    pub is_successful: bool,
    /// The response was malformed and the call degraded to an empty document.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

/// Bounds for the rolling transcript artifact.
#[derive(Debug, Clone)]
pub struct QueryLoggerConfig {
    /// Path of the active transcript file. Rotated files append `.1`, `.2`, …
    pub path: PathBuf,
    /// Rotate once the active file would exceed this size.
    pub max_file_bytes: u64,
    /// Number of rotated files kept after the active one.
    pub retained_files: usize,
}

impl QueryLoggerConfig {
    /// Defaults: 50 MB per file, 3 rotated files retained.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_file_bytes: 50 * 1024 * 1024,
            retained_files: 3,
        }
    }
}

/// Handle used by clients to append transcript records.
///
/// Cheap to clone; all clones feed the same background writer. A disabled
/// logger drops records without buffering.
#[derive(Clone)]
pub struct QueryLogger {
    tx: Option<mpsc::UnboundedSender<QueryRecord>>,
}

impl QueryLogger {
    /// Spawn the background writer and return the logging handle.
    pub fn spawn(config: QueryLoggerConfig) -> Self {
        Self::spawn_with_handle(config).0
    }

    /// Spawn the background writer, also returning its join handle. The
    /// writer drains remaining records and exits once every logger clone is
    /// dropped.
    pub fn spawn_with_handle(config: QueryLoggerConfig) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(drain(rx, config));
        (Self { tx: Some(tx) }, handle)
    }

    /// A logger that discards all records (tests, embedding without audit).
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Append a record, fire-and-forget.
    pub fn record(&self, record: QueryRecord) {
        if let Some(ref tx) = self.tx {
            // A closed writer is not the caller's problem.
            let _ = tx.send(record);
        }
    }
}

async fn drain(mut rx: mpsc::UnboundedReceiver<QueryRecord>, config: QueryLoggerConfig) {
    let mut current_size = tokio::fs::metadata(&config.path)
        .await
        .map(|m| m.len())
        .unwrap_or(0);

    while let Some(record) = rx.recv().await {
        match append(&config, &mut current_size, &record).await {
            Ok(()) => {}
            Err(e) => warn!(error = %e, path = %config.path.display(), "transcript write failed"),
        }
    }
}

async fn append(
    config: &QueryLoggerConfig,
    current_size: &mut u64,
    record: &QueryRecord,
) -> std::io::Result<()> {
    let mut line = serde_json::to_string(record)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    line.push('\n');

    if *current_size > 0 && *current_size + line.len() as u64 > config.max_file_bytes {
        rotate(config).await?;
        *current_size = 0;
    }

    if let Some(parent) = config.path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    use tokio::io::AsyncWriteExt;
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    *current_size += line.len() as u64;
    Ok(())
}

/// Shift `path.N` to `path.N+1` (dropping the oldest), then move the active
/// file to `path.1`.
async fn rotate(config: &QueryLoggerConfig) -> std::io::Result<()> {
    let rotated = |n: usize| {
        let mut name = config.path.as_os_str().to_os_string();
        name.push(format!(".{n}"));
        PathBuf::from(name)
    };

    let oldest = rotated(config.retained_files);
    if tokio::fs::metadata(&oldest).await.is_ok() {
        tokio::fs::remove_file(&oldest).await?;
    }

    for n in (1..config.retained_files).rev() {
        let from = rotated(n);
        if tokio::fs::metadata(&from).await.is_ok() {
            tokio::fs::rename(&from, rotated(n + 1)).await?;
        }
    }

    if config.retained_files > 0 && tokio::fs::metadata(&config.path).await.is_ok() {
        tokio::fs::rename(&config.path, rotated(1)).await?;
    }
    Ok(())
}
