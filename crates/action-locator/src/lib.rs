//! Element resolution by semantic role
//!
//! Each role carries a priority-ordered chain of strategies:
//! - exact attribute match inside the role's region
//! - attribute heuristics in the same region
//! - visible text, with negation markers excluded
//! - an unscoped fallback for the few roles that permit one
//!
//! Resolution is a pure function of a [`action_primitives::DomSnapshot`].

pub mod resolver;
pub mod strategies;
pub mod types;

pub use resolver::*;
pub use strategies::*;
pub use types::*;
