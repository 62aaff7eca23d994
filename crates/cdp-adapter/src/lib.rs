//! Chromium surface adapter
//!
//! Implements the surface ports on top of `chromiumoxide`: one page per
//! surface, DOM snapshots collected by an injected script, and interactions
//! addressed by the references that script assigns.

pub mod config;
pub mod error;
pub mod provider;
pub mod script;
pub mod surface;

pub use config::{detect_chrome_executable, BrowserSettings};
pub use error::AdapterError;
pub use provider::ChromiumSurfaceProvider;
pub use surface::ChromiumSurface;
