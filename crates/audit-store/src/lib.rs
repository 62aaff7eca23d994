//! Persistent outcome log.
//!
//! One record per work item keyed by `<scope>:<rowIndex>`, plus the persisted
//! running flag, kept in a single JSON document. Exports to CSV.

pub mod errors;
pub mod export;
pub mod model;
pub mod store;

pub use errors::AuditError;
pub use export::{write_csv, CSV_HEADER};
pub use model::{row_of, AuditDocument, AuditRecord};
pub use store::FileAuditStore;
