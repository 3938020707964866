//! Append-only audit log of inference results
//!
//! One JSON object per line, newest last. Writers are serialized through a
//! mutex and each record goes out in a single `write_all`, so concurrent
//! callers never interleave lines. A write that fails partway is cut back to
//! the previous line boundary so later records stay parseable.

use crate::models::InferenceResult;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Audit write failures. The decision they accompany stays valid.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit log I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize audit record: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("audit log writer lock poisoned")]
    Poisoned,
}

/// Destination for inference records
pub trait AuditSink: Send + Sync {
    /// Append one record
    fn record(&self, result: &InferenceResult) -> Result<(), AuditError>;
}

/// Append target that can be cut back to an earlier length
trait Truncate: Write {
    fn current_len(&mut self) -> io::Result<u64>;
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
}

impl Truncate for File {
    fn current_len(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Write one whole line or nothing
fn append_line<T: Truncate>(target: &mut T, line: &[u8]) -> io::Result<()> {
    let len = target.current_len()?;
    if let Err(err) = target.write_all(line) {
        if let Err(truncate_err) = target.truncate_to(len) {
            warn!(error = %truncate_err, "Failed to discard partial audit record");
        }
        return Err(err);
    }
    Ok(())
}

/// JSON Lines file opened in append mode
pub struct JsonlAuditLog {
    path: PathBuf,
    file: Mutex<File>,
    sync_on_write: bool,
}

impl JsonlAuditLog {
    /// Open (creating if needed) the log file and its parent directory
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AuditError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| AuditError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditError::Io {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            path,
            file: Mutex::new(file),
            sync_on_write: true,
        })
    }

    /// Skip the per-record fsync
    pub fn without_sync(mut self) -> Self {
        self.sync_on_write = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> AuditError {
        AuditError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl AuditSink for JsonlAuditLog {
    fn record(&self, result: &InferenceResult) -> Result<(), AuditError> {
        let mut line = serde_json::to_string(result)?;
        line.push('\n');

        let mut file = self.file.lock().map_err(|_| AuditError::Poisoned)?;
        append_line(&mut *file, line.as_bytes()).map_err(|e| self.io_error(e))?;
        if self.sync_on_write {
            file.sync_data().map_err(|e| self.io_error(e))?;
        }

        debug!(path = %self.path.display(), bytes = line.len(), "Audit record appended");
        Ok(())
    }
}

/// In-memory sink for embedding and tests
#[derive(Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<InferenceResult>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far, oldest first
    pub fn records(&self) -> Vec<InferenceResult> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, result: &InferenceResult) -> Result<(), AuditError> {
        self.records
            .lock()
            .map_err(|_| AuditError::Poisoned)?
            .push(result.clone());
        Ok(())
    }
}

/// Read every record of a JSON Lines audit log, oldest first
pub fn read_records(path: &Path) -> Result<Vec<InferenceResult>, AuditError> {
    let file = File::open(path).map_err(|source| AuditError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| AuditError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}
