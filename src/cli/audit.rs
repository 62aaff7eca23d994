use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use audit_store::{AuditError, FileAuditStore};
use clap::{Args, Subcommand};
use tracing::info;

use crate::config::AppConfig;

#[derive(Args, Clone, Debug)]
pub struct AuditArgs {
    #[command(subcommand)]
    pub action: AuditAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum AuditAction {
    /// Export recorded outcomes as CSV (stdout unless --output is given)
    Export {
        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove every recorded outcome so profiles can be processed again
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

pub async fn cmd_audit(args: AuditArgs, config: &AppConfig) -> Result<()> {
    let path = config.storage.resolved_audit_path();
    let store = FileAuditStore::open(&path)
        .await
        .with_context(|| format!("failed to open audit log {}", path.display()))?;

    match args.action {
        AuditAction::Export { output } => match output {
            Some(target) => {
                let rows = store.export_csv_to(&target).await.map_err(export_error)?;
                info!(rows, path = %target.display(), "audit log exported");
                println!("Exported {} rows to {}", rows, target.display());
            }
            None => {
                let csv = store.export_csv().await.map_err(export_error)?;
                print!("{csv}");
            }
        },
        AuditAction::Clear { yes } => {
            if !yes {
                bail!("Clear all sent profile records? Re-run with --yes to confirm.");
            }
            let removed = store.clear().await.context("failed to clear audit log")?;
            info!(removed, path = %path.display(), "audit log cleared");
            println!("Log cleared ({removed} records).");
        }
    }
    Ok(())
}

fn export_error(err: AuditError) -> anyhow::Error {
    match err {
        AuditError::Empty => anyhow::anyhow!("{err}"),
        other => anyhow::Error::new(other).context("failed to export audit log"),
    }
}
