//! Scripted in-memory surfaces.
//!
//! A [`ScriptedSurface`] serves a current snapshot and swaps it when a scripted
//! element is clicked, which is enough to walk the actuator through every
//! branch without a browser.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use outreach_core_types::SurfaceHandle;
use parking_lot::Mutex;
use url::Url;

use crate::{ActionError, DomSnapshot, ElementRef, Surface, SurfaceProvider};

#[derive(Debug, Default)]
struct ScriptState {
    current: DomSnapshot,
    on_click: HashMap<ElementRef, DomSnapshot>,
    on_dismiss: Option<DomSnapshot>,
    loading_snapshots: u32,
    reject_fill: bool,
    clicks: Vec<ElementRef>,
    fills: Vec<(ElementRef, String)>,
    dismissals: u32,
    snapshots_taken: u32,
}

/// Snapshot-driven fake surface.
#[derive(Debug, Default)]
pub struct ScriptedSurface {
    state: Mutex<ScriptState>,
    closed: AtomicBool,
}

impl ScriptedSurface {
    pub fn new(initial: DomSnapshot) -> Self {
        Self {
            state: Mutex::new(ScriptState {
                current: initial,
                ..ScriptState::default()
            }),
            closed: AtomicBool::new(false),
        }
    }

    /// Swap to `next` after `element` is clicked.
    pub fn on_click(self, element: &str, next: DomSnapshot) -> Self {
        self.state
            .lock()
            .on_click
            .insert(ElementRef(element.to_string()), next);
        self
    }

    /// Swap to `next` when menus are dismissed.
    pub fn on_dismiss(self, next: DomSnapshot) -> Self {
        self.state.lock().on_dismiss = Some(next);
        self
    }

    /// Report `has_main = false` for the first `count` snapshots.
    pub fn loading_for(self, count: u32) -> Self {
        self.state.lock().loading_snapshots = count;
        self
    }

    /// Accept fills but leave the value untouched, as a framework that
    /// ignores plain assignment would.
    pub fn rejecting_fill(self) -> Self {
        self.state.lock().reject_fill = true;
        self
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().clicks.iter().map(|r| r.0.clone()).collect()
    }

    pub fn fills(&self) -> Vec<(String, String)> {
        self.state
            .lock()
            .fills
            .iter()
            .map(|(r, text)| (r.0.clone(), text.clone()))
            .collect()
    }

    pub fn dismissals(&self) -> u32 {
        self.state.lock().dismissals
    }

    pub fn snapshots_taken(&self) -> u32 {
        self.state.lock().snapshots_taken
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), ActionError> {
        if self.is_closed() {
            return Err(ActionError::SurfaceClosed("scripted surface".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Surface for ScriptedSurface {
    async fn snapshot(&self) -> Result<DomSnapshot, ActionError> {
        self.ensure_open()?;
        let mut state = self.state.lock();
        state.snapshots_taken += 1;
        if state.loading_snapshots > 0 {
            state.loading_snapshots -= 1;
            return Ok(DomSnapshot::default());
        }
        Ok(state.current.clone())
    }

    async fn click(&self, element: &ElementRef) -> Result<(), ActionError> {
        self.ensure_open()?;
        let mut state = self.state.lock();
        if state.current.get(element).is_none() {
            return Err(ActionError::Detached(element.0.clone()));
        }
        state.clicks.push(element.clone());
        if let Some(next) = state.on_click.get(element).cloned() {
            state.current = next;
        }
        Ok(())
    }

    async fn fill(&self, element: &ElementRef, text: &str) -> Result<(), ActionError> {
        self.ensure_open()?;
        let mut state = self.state.lock();
        state.fills.push((element.clone(), text.to_string()));
        let reject = state.reject_fill;
        let node = state
            .current
            .elements
            .iter_mut()
            .find(|el| &el.node == element)
            .ok_or_else(|| ActionError::Detached(element.0.clone()))?;
        node.value = Some(if reject { String::new() } else { text.to_string() });
        Ok(())
    }

    async fn read_value(&self, element: &ElementRef) -> Result<Option<String>, ActionError> {
        self.ensure_open()?;
        let state = self.state.lock();
        Ok(state
            .current
            .get(element)
            .map(|el| el.value.clone().unwrap_or_default()))
    }

    async fn dismiss_menus(&self) -> Result<(), ActionError> {
        self.ensure_open()?;
        let mut state = self.state.lock();
        state.dismissals += 1;
        if let Some(next) = state.on_dismiss.clone() {
            state.current = next;
        }
        Ok(())
    }
}

type SurfaceFactory = dyn Fn(&Url) -> ScriptedSurface + Send + Sync;

/// Provider handing out scripted surfaces and recording their lifecycle.
pub struct ScriptedProvider {
    factory: Box<SurfaceFactory>,
    surfaces: Mutex<HashMap<SurfaceHandle, Arc<ScriptedSurface>>>,
    opened: Mutex<Vec<(SurfaceHandle, Url)>>,
    closed: Mutex<Vec<SurfaceHandle>>,
    failing_targets: Mutex<Vec<Url>>,
}

impl ScriptedProvider {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&Url) -> ScriptedSurface + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            surfaces: Mutex::new(HashMap::new()),
            opened: Mutex::new(Vec::new()),
            closed: Mutex::new(Vec::new()),
            failing_targets: Mutex::new(Vec::new()),
        }
    }

    /// Every surface is an empty page with a `main` landmark.
    pub fn blank() -> Self {
        Self::new(|_| ScriptedSurface::new(DomSnapshot::new(true, Vec::new())))
    }

    pub fn fail_open_for(&self, target: Url) {
        self.failing_targets.lock().push(target);
    }

    pub fn opened(&self) -> Vec<(SurfaceHandle, Url)> {
        self.opened.lock().clone()
    }

    pub fn closed(&self) -> Vec<SurfaceHandle> {
        self.closed.lock().clone()
    }

    /// Handles opened and never closed.
    pub fn still_open(&self) -> Vec<SurfaceHandle> {
        let closed = self.closed.lock();
        self.opened
            .lock()
            .iter()
            .map(|(handle, _)| handle.clone())
            .filter(|handle| !closed.contains(handle))
            .collect()
    }

    pub fn scripted(&self, handle: &SurfaceHandle) -> Option<Arc<ScriptedSurface>> {
        self.surfaces.lock().get(handle).cloned()
    }
}

#[async_trait]
impl SurfaceProvider for ScriptedProvider {
    async fn open(&self, target: &Url) -> Result<SurfaceHandle, ActionError> {
        if self.failing_targets.lock().contains(target) {
            return Err(ActionError::CdpIo(format!("cannot open {target}")));
        }
        let handle = SurfaceHandle::new();
        let surface = Arc::new((self.factory)(target));
        self.surfaces.lock().insert(handle.clone(), surface);
        self.opened.lock().push((handle.clone(), target.clone()));
        Ok(handle)
    }

    async fn wait_loaded(&self, handle: &SurfaceHandle) -> Result<(), ActionError> {
        if self.surfaces.lock().contains_key(handle) {
            Ok(())
        } else {
            Err(ActionError::SurfaceClosed(handle.to_string()))
        }
    }

    fn surface(&self, handle: &SurfaceHandle) -> Option<Arc<dyn Surface>> {
        self.surfaces
            .lock()
            .get(handle)
            .filter(|surface| !surface.is_closed())
            .map(|surface| Arc::clone(surface) as Arc<dyn Surface>)
    }

    async fn close(&self, handle: &SurfaceHandle) -> Result<(), ActionError> {
        let surface = self
            .surfaces
            .lock()
            .get(handle)
            .cloned()
            .ok_or_else(|| ActionError::SurfaceClosed(handle.to_string()))?;
        surface.close();
        self.closed.lock().push(handle.clone());
        Ok(())
    }
}
