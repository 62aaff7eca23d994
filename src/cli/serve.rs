use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use outreach_scheduler::RunControl;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::app_context::AppContext;
use crate::cli::context::CliContext;
use crate::server::{build_router, ServeState};
use crate::source::SheetsSource;

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Port for the control API (defaults to server.port)
    #[arg(long)]
    pub port: Option<u16>,

    /// Run Chromium without a window
    #[arg(long)]
    pub headless: bool,

    /// Attach to an existing Chrome DevTools websocket
    #[arg(long)]
    pub ws_url: Option<String>,
}

pub async fn cmd_serve(args: ServeArgs, ctx: &CliContext) -> Result<()> {
    let mut config = ctx.config().clone();
    if args.headless {
        config.browser.headless = true;
    }
    if let Some(ws_url) = args.ws_url {
        config.browser.websocket_url = Some(ws_url);
    }
    let port = args.port.unwrap_or(config.server.port);

    let app = AppContext::launch(&config, Arc::new(SheetsSource::new()?)).await?;
    let router = build_router(ServeState::new(app.orchestrator().clone()));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind control server on {}", addr))?;
    info!("Control API available at http://127.0.0.1:{}", port);
    warn!("The control API has no authentication; keep it on localhost");

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(?err, "failed to listen for Ctrl-C");
            }
            info!("shutting down control server");
        })
        .await
        .context("control server exited unexpectedly");

    if let Err(err) = app.orchestrator().stop().await {
        warn!(error = %err, "failed to stop run during shutdown");
    }
    app.shutdown().await?;
    served
}
