use outreach_scheduler::Orchestrator;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ServeState {
    orchestrator: Orchestrator,
}

impl ServeState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }
}
