//! Surface capability layer
//!
//! This crate provides the building blocks the actuator works against:
//! - `Surface` / `SurfaceProvider` ports implemented by the browser adapter
//! - A flat DOM snapshot model with region flags for scoped lookups
//! - `RetryPolicy` and `poll_until` for bounded cooperative waits

pub mod errors;
mod surface;
pub mod types;
mod waiting;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use errors::*;
pub use surface::*;
pub use types::*;
pub use waiting::*;
