//! Surface capability ports.

use std::sync::Arc;

use async_trait::async_trait;
use outreach_core_types::SurfaceHandle;
use url::Url;

use crate::{errors::ActionError, types::DomSnapshot, ElementRef};

/// Query and interaction interface of one open page.
#[async_trait]
pub trait Surface: Send + Sync {
    /// Collect the current candidate elements.
    async fn snapshot(&self) -> Result<DomSnapshot, ActionError>;

    /// Activate an element as a user click would.
    async fn click(&self, element: &ElementRef) -> Result<(), ActionError>;

    /// Clear a text field and set its value through the native property
    /// setter, then dispatch input/change/keyboard events so framework-bound
    /// listeners observe the mutation.
    async fn fill(&self, element: &ElementRef, text: &str) -> Result<(), ActionError>;

    /// Current value of a form field, `None` if the element is gone.
    async fn read_value(&self, element: &ElementRef) -> Result<Option<String>, ActionError>;

    /// Close any open disclosure menu (a click on the document body).
    async fn dismiss_menus(&self) -> Result<(), ActionError>;
}

/// Opens and closes surfaces. Creation/destruction is owned by the provider.
#[async_trait]
pub trait SurfaceProvider: Send + Sync {
    async fn open(&self, target: &Url) -> Result<SurfaceHandle, ActionError>;

    /// Resolve once the surface reports load-complete.
    async fn wait_loaded(&self, handle: &SurfaceHandle) -> Result<(), ActionError>;

    /// Live surface behind a handle, `None` once closed.
    fn surface(&self, handle: &SurfaceHandle) -> Option<Arc<dyn Surface>>;

    async fn close(&self, handle: &SurfaceHandle) -> Result<(), ActionError>;
}
