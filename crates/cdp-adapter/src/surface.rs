use std::sync::atomic::{AtomicBool, Ordering};

use action_primitives::{ActionError, DomSnapshot, ElementRef, Surface};
use async_trait::async_trait;
use chromiumoxide::Page;
use outreach_core_types::SurfaceHandle;
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::error::AdapterError;
use crate::script::{
    click_expression, fill_expression, read_expression, RawSnapshot, DISMISS_SCRIPT,
    SNAPSHOT_SCRIPT,
};

/// One Chromium page driven through injected scripts.
pub struct ChromiumSurface {
    handle: SurfaceHandle,
    page: Page,
    closed: AtomicBool,
}

impl ChromiumSurface {
    pub fn new(handle: SurfaceHandle, page: Page) -> Self {
        Self {
            handle,
            page,
            closed: AtomicBool::new(false),
        }
    }

    pub fn handle(&self) -> &SurfaceHandle {
        &self.handle
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub(crate) fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn eval<T: DeserializeOwned>(&self, expression: String) -> Result<T, ActionError> {
        if self.is_closed() {
            return Err(ActionError::SurfaceClosed(self.handle.to_string()));
        }
        let result = self
            .page
            .evaluate(expression)
            .await
            .map_err(AdapterError::from)?;
        let value = result.into_value::<T>().map_err(AdapterError::from)?;
        Ok(value)
    }
}

#[async_trait]
impl Surface for ChromiumSurface {
    async fn snapshot(&self) -> Result<DomSnapshot, ActionError> {
        let raw: RawSnapshot = self.eval(SNAPSHOT_SCRIPT.to_string()).await?;
        trace!(surface = %self.handle, elements = raw.elements.len(), "snapshot collected");
        Ok(raw.into())
    }

    async fn click(&self, element: &ElementRef) -> Result<(), ActionError> {
        let expression = click_expression(element).map_err(AdapterError::from)?;
        if self.eval::<bool>(expression).await? {
            Ok(())
        } else {
            Err(ActionError::Detached(element.to_string()))
        }
    }

    async fn fill(&self, element: &ElementRef, text: &str) -> Result<(), ActionError> {
        let expression = fill_expression(element, text).map_err(AdapterError::from)?;
        if self.eval::<bool>(expression).await? {
            Ok(())
        } else {
            Err(ActionError::Detached(element.to_string()))
        }
    }

    async fn read_value(&self, element: &ElementRef) -> Result<Option<String>, ActionError> {
        let expression = read_expression(element).map_err(AdapterError::from)?;
        self.eval(expression).await
    }

    async fn dismiss_menus(&self) -> Result<(), ActionError> {
        self.eval::<bool>(DISMISS_SCRIPT.to_string()).await?;
        Ok(())
    }
}
