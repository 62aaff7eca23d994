//! HTTP control surface for a running orchestrator.

mod router;
mod state;

pub use router::{build_router, StartForm};
pub use state::ServeState;
