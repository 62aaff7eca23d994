use std::sync::Arc;

use action_primitives::{ActionError, Surface, SurfaceProvider};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use dashmap::DashMap;
use futures::StreamExt;
use outreach_core_types::SurfaceHandle;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::BrowserSettings;
use crate::error::AdapterError;
use crate::surface::ChromiumSurface;

/// Opens one Chromium page per work item.
pub struct ChromiumSurfaceProvider {
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
    surfaces: DashMap<SurfaceHandle, Arc<ChromiumSurface>>,
    settings: BrowserSettings,
}

impl ChromiumSurfaceProvider {
    /// Launch a browser, or attach to `settings.websocket_url` when set.
    pub async fn launch(settings: BrowserSettings) -> Result<Self, AdapterError> {
        let (browser, mut handler) = match &settings.websocket_url {
            Some(ws_url) => {
                info!(url = %ws_url, "attaching to running browser");
                Browser::connect(ws_url.as_str()).await?
            }
            None => {
                let config = browser_config(&settings)?;
                Browser::launch(config)
                    .await
                    .map_err(|err| AdapterError::Launch(err.to_string()))?
            }
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    warn!(error = %err, "browser connection error");
                    break;
                }
            }
            debug!("browser handler finished");
        });

        info!(headless = settings.headless, "chromium ready");
        Ok(Self {
            browser: Mutex::new(browser),
            handler,
            surfaces: DashMap::new(),
            settings,
        })
    }

    pub fn settings(&self) -> &BrowserSettings {
        &self.settings
    }

    pub fn open_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Close the browser. Pages left open for review go with it.
    pub async fn shutdown(&self) -> Result<(), AdapterError> {
        self.surfaces.clear();
        let mut browser = self.browser.lock().await;
        if self.settings.websocket_url.is_none() {
            browser.close().await?;
        }
        self.handler.abort();
        Ok(())
    }

    fn lookup(&self, handle: &SurfaceHandle) -> Result<Arc<ChromiumSurface>, ActionError> {
        self.surfaces
            .get(handle)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ActionError::SurfaceClosed(handle.to_string()))
    }
}

fn browser_config(settings: &BrowserSettings) -> Result<BrowserConfig, AdapterError> {
    let executable = settings
        .resolve_executable()
        .ok_or(AdapterError::ExecutableNotFound)?;

    let mut builder = BrowserConfig::builder()
        .chrome_executable(executable)
        .window_size(settings.window_width, settings.window_height)
        .request_timeout(settings.load_timeout());
    if !settings.headless {
        builder = builder.with_head();
    }
    if let Some(dir) = &settings.user_data_dir {
        builder = builder.user_data_dir(dir);
    }
    builder.build().map_err(AdapterError::Config)
}

#[async_trait]
impl SurfaceProvider for ChromiumSurfaceProvider {
    async fn open(&self, target: &Url) -> Result<SurfaceHandle, ActionError> {
        let page = {
            let browser = self.browser.lock().await;
            browser
                .new_page(target.as_str())
                .await
                .map_err(AdapterError::from)?
        };
        let handle = SurfaceHandle::new();
        debug!(surface = %handle, url = %target, "page opened");
        self.surfaces.insert(
            handle.clone(),
            Arc::new(ChromiumSurface::new(handle.clone(), page)),
        );
        Ok(handle)
    }

    async fn wait_loaded(&self, handle: &SurfaceHandle) -> Result<(), ActionError> {
        let surface = self.lookup(handle)?;
        match timeout(self.settings.load_timeout(), surface.page().wait_for_navigation()).await {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => return Err(AdapterError::from(err).into()),
            Err(_) => return Err(ActionError::NavTimeout(handle.to_string())),
        }
        sleep(self.settings.render_settle()).await;
        debug!(surface = %handle, "page loaded");
        Ok(())
    }

    fn surface(&self, handle: &SurfaceHandle) -> Option<Arc<dyn Surface>> {
        self.surfaces
            .get(handle)
            .filter(|entry| !entry.value().is_closed())
            .map(|entry| Arc::clone(entry.value()) as Arc<dyn Surface>)
    }

    async fn close(&self, handle: &SurfaceHandle) -> Result<(), ActionError> {
        let (_, surface) = self
            .surfaces
            .remove(handle)
            .ok_or_else(|| ActionError::SurfaceClosed(handle.to_string()))?;
        surface.mark_closed();
        surface
            .page()
            .clone()
            .close()
            .await
            .map_err(AdapterError::from)?;
        debug!(surface = %handle, "page closed");
        Ok(())
    }
}
