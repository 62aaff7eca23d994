use thiserror::Error;

use outreach_scheduler::StorageError;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("audit file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("No sent profiles to export.")]
    Empty,
}

impl From<AuditError> for StorageError {
    fn from(value: AuditError) -> Self {
        StorageError(value.to_string())
    }
}
