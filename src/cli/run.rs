use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Args;
use outreach_event_bus::{StatusKind, StatusUpdate};
use outreach_scheduler::{
    ListRequest, Orchestrator, RunConfig, RunControl, RunStatus, StartRequest, WorkListSource,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::app_context::AppContext;
use crate::cli::context::CliContext;
use crate::config::AppConfig;
use crate::source::{SheetsSource, StaticSource};

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Read profile links from a local CSV file instead of the sheet
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Spreadsheet id
    #[arg(long)]
    pub sheet_id: Option<String>,

    /// Sheets API key
    #[arg(long)]
    pub api_key: Option<String>,

    /// A1 range holding the profile links, e.g. `Sheet1!A2:A`
    #[arg(long)]
    pub range: Option<String>,

    /// Note template; `{firstName}` and `{lastName}` are substituted
    #[arg(short, long)]
    pub message: Option<String>,

    /// Seconds to wait between profiles (minimum 5)
    #[arg(long)]
    pub delay: Option<u64>,

    /// Run Chromium without a window
    #[arg(long)]
    pub headless: bool,

    /// Attach to an existing Chrome DevTools websocket
    #[arg(long)]
    pub ws_url: Option<String>,

    /// Close the browser at the end even when tabs were kept for review
    #[arg(long)]
    pub close_on_finish: bool,
}

impl RunArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(sheet_id) = &self.sheet_id {
            config.sheet.sheet_id = sheet_id.clone();
        }
        if let Some(api_key) = &self.api_key {
            config.sheet.api_key = api_key.clone();
        }
        if let Some(range) = &self.range {
            config.sheet.range = range.clone();
        }
        if let Some(message) = &self.message {
            config.run.message = message.clone();
        }
        if let Some(delay) = self.delay {
            config.run.delay_secs = delay;
        }
        if self.headless {
            config.browser.headless = true;
        }
        if let Some(ws_url) = &self.ws_url {
            config.browser.websocket_url = Some(ws_url.clone());
        }
    }
}

pub async fn cmd_run(args: RunArgs, ctx: &CliContext) -> Result<()> {
    let mut config = ctx.config().clone();
    args.apply(&mut config);

    let message = config.run.message.trim();
    if message.is_empty() {
        bail!("a message template is required (run.message or --message)");
    }
    let run_config = RunConfig::new(message, config.run.delay_secs)?;

    let (source, list) = resolve_source(&args, &config)?;
    let app = AppContext::launch(&config, source).await?;
    let outcome = drive(app.orchestrator(), StartRequest { list, config: run_config }).await;

    if let Ok(status) = &outcome {
        if status.tally.failed > 0 && !args.close_on_finish && !config.browser.headless {
            println!(
                "{} tab(s) kept open for review. Press Ctrl-C to close the browser.",
                status.tally.failed
            );
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for Ctrl-C")?;
        }
    }
    app.shutdown().await?;
    outcome.map(|_| ())
}

fn resolve_source(
    args: &RunArgs,
    config: &AppConfig,
) -> Result<(Arc<dyn WorkListSource>, ListRequest)> {
    if let Some(path) = &args.input {
        let source = StaticSource::from_path(path)
            .with_context(|| format!("failed to read work list {}", path.display()))?;
        let scope = source
            .scope()
            .map(|scope| scope.0.clone())
            .unwrap_or_else(|| "input".to_string());
        info!(path = %path.display(), profiles = source.len(), "using local work list");
        let list = ListRequest {
            sheet_id: scope.clone(),
            api_key: String::new(),
            range: scope,
        };
        return Ok((Arc::new(source), list));
    }

    let list = config.sheet.list_request();
    if list.sheet_id.is_empty() || list.api_key.is_empty() || list.range.is_empty() {
        bail!("sheet.sheet_id, sheet.api_key and sheet.range are required unless --input is given");
    }
    Ok((Arc::new(SheetsSource::new()?), list))
}

/// Start the run and relay status updates until it finishes. Ctrl-C stops
/// the run; typing `skip` or `stop` on stdin does the same as the HTTP API.
async fn drive(orchestrator: &Orchestrator, request: StartRequest) -> Result<RunStatus> {
    let mut updates = orchestrator.subscribe();
    let started = Instant::now();
    let queued = orchestrator.start(request).await.context("run did not start")?;
    info!(queued, "run started");

    let mut commands = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut stopping = false;

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(update) => {
                    print_update(&update);
                    if update.completed {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "status output lagged"),
                Err(RecvError::Closed) => break,
            },
            line = commands.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match line.trim() {
                    "skip" | "s" => match orchestrator.skip().await {
                        Ok(outcome) => {
                            if let Some(message) = outcome.message() {
                                println!("{message}");
                            }
                        }
                        Err(err) => println!("Cannot skip: {err}"),
                    },
                    "stop" | "q" => {
                        stopping = true;
                        orchestrator.stop().await?;
                    }
                    "" => {}
                    other => println!("Unknown command '{other}'. Use 'skip' or 'stop'."),
                },
                Ok(None) | Err(_) => stdin_open = false,
            },
            signal = tokio::signal::ctrl_c(), if !stopping => {
                signal.context("failed to listen for Ctrl-C")?;
                info!("interrupt received; stopping run");
                stopping = true;
                orchestrator.stop().await?;
            }
        }
    }

    let status = orchestrator.status().await?;
    info!(
        sent = status.tally.sent,
        skipped = status.tally.skipped,
        failed = status.tally.failed,
        elapsed = %humantime::format_duration(round_secs(started.elapsed())),
        "run finished"
    );
    Ok(status)
}

fn round_secs(elapsed: std::time::Duration) -> std::time::Duration {
    std::time::Duration::from_secs(elapsed.as_secs())
}

fn print_update(update: &StatusUpdate) {
    let tag = match update.kind {
        StatusKind::Running => "..",
        StatusKind::Success => "ok",
        StatusKind::Error => "!!",
    };
    match &update.progress {
        Some(progress) => println!("[{tag}] {} ({progress})", update.status),
        None => println!("[{tag}] {}", update.status),
    }
    if update.show_skip {
        println!("     type 'skip' to move on, or 'stop' to end the run");
    }
}
