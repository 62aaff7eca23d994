use std::path::{Path, PathBuf};

use async_trait::async_trait;
use outreach_scheduler::{AuditEntry, AuditLog, StorageError};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::errors::AuditError;
use crate::export::write_csv;
use crate::model::{AuditDocument, AuditRecord};

/// JSON-file audit log. Every mutation rewrites the whole file through a
/// temp file and a rename, so readers never observe a partial document.
pub struct FileAuditStore {
    path: PathBuf,
    document: Mutex<AuditDocument>,
}

impl FileAuditStore {
    /// Load the document at `path`, starting empty when it does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, AuditError> {
        let path = path.into();
        let document = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => AuditDocument::default(),
            Err(err) => return Err(err.into()),
        };
        debug!(path = %path.display(), entries = document.entries.len(), "audit store opened");
        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn snapshot(&self) -> AuditDocument {
        self.document.lock().await.clone()
    }

    pub async fn get(&self, key: &str) -> Option<AuditRecord> {
        self.document.lock().await.entries.get(key).cloned()
    }

    /// Insert or overwrite the record for `entry.key`.
    pub async fn put(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        let mut document = self.document.lock().await;
        document
            .entries
            .insert(entry.key.clone(), AuditRecord::from(entry));
        persist(&self.path, &document).await
    }

    pub async fn mark_running(&self, running: bool) -> Result<(), AuditError> {
        let mut document = self.document.lock().await;
        document.is_running = running;
        persist(&self.path, &document).await
    }

    /// Drop every record. The running flag is kept.
    pub async fn clear(&self) -> Result<usize, AuditError> {
        let mut document = self.document.lock().await;
        let removed = document.entries.len();
        document.entries.clear();
        persist(&self.path, &document).await?;
        info!(removed, "audit log cleared");
        Ok(removed)
    }

    /// Render the log as CSV into memory.
    pub async fn export_csv(&self) -> Result<String, AuditError> {
        let document = self.document.lock().await;
        let mut out = Vec::new();
        write_csv(&document, &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Write the CSV export to `target`, replacing it atomically.
    pub async fn export_csv_to(&self, target: &Path) -> Result<usize, AuditError> {
        let document = self.document.lock().await;
        let mut out = Vec::new();
        let rows = write_csv(&document, &mut out)?;
        write_atomic(target, &out).await?;
        info!(rows, path = %target.display(), "audit log exported");
        Ok(rows)
    }
}

#[async_trait]
impl AuditLog for FileAuditStore {
    async fn record(&self, entry: AuditEntry) -> Result<(), StorageError> {
        self.put(&entry).await.map_err(StorageError::from)
    }

    async fn set_running(&self, running: bool) -> Result<(), StorageError> {
        self.mark_running(running).await.map_err(StorageError::from)
    }
}

async fn persist(path: &Path, document: &AuditDocument) -> Result<(), AuditError> {
    let bytes = serde_json::to_vec_pretty(document)?;
    write_atomic(path, &bytes).await
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), AuditError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
