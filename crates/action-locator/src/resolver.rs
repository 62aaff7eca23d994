//! Element resolver with fallback chain orchestration

use action_primitives::{DomSnapshot, ScopeFlags};
use tracing::{debug, trace};

use crate::strategies::{chain_for, StrategyStep};
use crate::types::{LocatorStrategy, Resolution, Role};

/// Name used when the subject's heading cannot be read.
pub const DEFAULT_SUBJECT_NAME: &str = "there";

/// Element resolver trait
///
/// Resolution never fails loudly: an unresolvable role yields `None` and the
/// caller decides which failure that maps to.
pub trait ElementResolver: Send + Sync {
    /// Resolve a role by walking its fallback chain.
    fn resolve(&self, role: Role, snapshot: &DomSnapshot) -> Option<Resolution>;

    /// Try only the steps belonging to one strategy.
    fn resolve_with_strategy(
        &self,
        role: Role,
        snapshot: &DomSnapshot,
        strategy: LocatorStrategy,
    ) -> Option<Resolution>;
}

/// Default element resolver over the static strategy tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultElementResolver;

impl DefaultElementResolver {
    pub fn new() -> Self {
        Self
    }

    /// Display name of the subject, falling back to [`DEFAULT_SUBJECT_NAME`].
    pub fn subject_name(&self, snapshot: &DomSnapshot) -> String {
        self.resolve(Role::SubjectName, snapshot)
            .map(|resolution| resolution.text)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SUBJECT_NAME.to_string())
    }

    /// Whether the role resolves at all.
    pub fn present(&self, role: Role, snapshot: &DomSnapshot) -> bool {
        self.resolve(role, snapshot).is_some()
    }

    /// Walk the role's chain, keeping only matches inside `region`.
    pub fn resolve_within(
        &self,
        role: Role,
        snapshot: &DomSnapshot,
        region: ScopeFlags,
    ) -> Option<Resolution> {
        chain_for(role).iter().find_map(|step| {
            let narrowed = StrategyStep {
                scope: Some(step.scope.map_or(region, |scope| scope | region)),
                ..*step
            };
            run_step(role, &narrowed, snapshot)
        })
    }
}

fn run_step(role: Role, step: &StrategyStep, snapshot: &DomSnapshot) -> Option<Resolution> {
    let matched = match step.scope {
        Some(scope) => snapshot
            .find_all_in_scope(scope)
            .find(|el| (step.matches)(el)),
        None => snapshot.elements.iter().find(|el| (step.matches)(el)),
    }?;
    Some(Resolution {
        element: matched.node.clone(),
        role,
        strategy: step.strategy,
        text: matched.text.clone(),
    })
}

impl ElementResolver for DefaultElementResolver {
    fn resolve(&self, role: Role, snapshot: &DomSnapshot) -> Option<Resolution> {
        trace!(%role, "resolving element");

        for step in chain_for(role) {
            if let Some(resolution) = run_step(role, step, snapshot) {
                debug!(
                    %role,
                    strategy = step.strategy.name(),
                    element = %resolution.element,
                    "resolved element"
                );
                return Some(resolution);
            }
        }

        trace!(%role, "all strategies exhausted");
        None
    }

    fn resolve_with_strategy(
        &self,
        role: Role,
        snapshot: &DomSnapshot,
        strategy: LocatorStrategy,
    ) -> Option<Resolution> {
        chain_for(role)
            .iter()
            .filter(|step| step.strategy == strategy)
            .find_map(|step| run_step(role, step, snapshot))
    }
}
