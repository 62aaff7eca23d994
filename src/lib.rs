//! Outreach runner library
//!
//! Wires the orchestrator to the Chromium adapter, the Sheets work-list source
//! and the file audit log, and exposes the CLI and HTTP control surfaces.

pub mod app_context;
pub mod cli;
pub mod config;
pub mod server;
pub mod source;

pub use app_context::{assemble, AppContext};
pub use config::AppConfig;
pub use server::{build_router, ServeState, StartForm};
pub use source::{parse_rows, SheetsSource, StaticSource};
