use clap::Subcommand;

use super::audit::AuditArgs;
use super::config::ConfigArgs;
use super::run::RunArgs;
use super::serve::ServeArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Process a work list and stream progress until the run ends
    Run(RunArgs),

    /// Serve the HTTP control API (start/stop/skip/status/events)
    Serve(ServeArgs),

    /// Export or clear the audit log
    Audit(AuditArgs),

    /// Inspect the effective configuration
    Config(ConfigArgs),
}
