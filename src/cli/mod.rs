pub mod app;
pub mod audit;
pub mod commands;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod run;
pub mod runtime;
pub mod serve;

pub use audit::{cmd_audit, AuditArgs};
pub use run::{cmd_run, RunArgs};
pub use serve::{cmd_serve, ServeArgs};
