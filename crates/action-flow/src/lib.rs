//! Page-side actuator
//!
//! This crate runs the invitation pipeline against one surface, personalises
//! the note, and hosts actuators behind the messaging bridge.

pub mod errors;
pub mod executor;
pub mod host;
pub mod personalize;
pub mod types;

pub use errors::FlowError;
pub use executor::{Actuator, SurfaceActuator};
pub use host::{ActuatorListener, ActuatorTransport, HostedSurfaceProvider};
pub use personalize::{personalize, split_name};
pub use types::{ActuatorTimings, Stage};
