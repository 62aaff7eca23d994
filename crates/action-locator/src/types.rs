//! Core types for the locator

use action_primitives::ElementRef;
use serde::{Deserialize, Serialize};

/// Locator strategy enumeration, in fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocatorStrategy {
    /// Exact attribute match inside the role's designated region
    ExactAttribute,

    /// Attribute substring/heuristic match inside the same region
    AttributeHeuristic,

    /// Visible text match inside the same region, negation markers excluded
    VisibleText,

    /// Whole-surface fallback for roles whose region sometimes omits the control
    Unscoped,
}

impl LocatorStrategy {
    /// Get strategy name as string
    pub fn name(&self) -> &'static str {
        match self {
            LocatorStrategy::ExactAttribute => "exact-attribute",
            LocatorStrategy::AttributeHeuristic => "attribute-heuristic",
            LocatorStrategy::VisibleText => "visible-text",
            LocatorStrategy::Unscoped => "unscoped",
        }
    }

    /// Get all strategies in fallback order
    pub fn fallback_chain() -> Vec<LocatorStrategy> {
        vec![
            LocatorStrategy::ExactAttribute,
            LocatorStrategy::AttributeHeuristic,
            LocatorStrategy::VisibleText,
            LocatorStrategy::Unscoped,
        ]
    }
}

/// Semantic role of an element the actuator needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Primary "connect" action in the subject's top card
    ConnectAffordance,
    /// Connect entry inside the "more actions" menu
    MenuConnect,
    /// Any invite-to-connect control anywhere on the surface
    AnyConnectControl,
    /// "More actions" disclosure button
    MoreActions,
    /// "Remove connection" entry inside the disclosure menu
    RemoveConnection,
    /// "Pending" invitation indicator
    PendingIndicator,
    /// Follow button
    FollowAffordance,
    /// Connection distance badge ("1st", "2nd", ...)
    DistanceBadge,
    /// Subject display name heading
    SubjectName,
    /// Response dialog root
    Dialog,
    /// "Add a note" toggle inside the dialog
    NoteToggle,
    /// Note text field
    MessageField,
    /// Confirmation ("send") action inside the dialog
    SendAffordance,
}

impl Role {
    pub const ALL: [Role; 13] = [
        Role::ConnectAffordance,
        Role::MenuConnect,
        Role::AnyConnectControl,
        Role::MoreActions,
        Role::RemoveConnection,
        Role::PendingIndicator,
        Role::FollowAffordance,
        Role::DistanceBadge,
        Role::SubjectName,
        Role::Dialog,
        Role::NoteToggle,
        Role::MessageField,
        Role::SendAffordance,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Role::ConnectAffordance => "connect-affordance",
            Role::MenuConnect => "menu-connect",
            Role::AnyConnectControl => "any-connect-control",
            Role::MoreActions => "more-actions",
            Role::RemoveConnection => "remove-connection",
            Role::PendingIndicator => "pending-indicator",
            Role::FollowAffordance => "follow-affordance",
            Role::DistanceBadge => "distance-badge",
            Role::SubjectName => "subject-name",
            Role::Dialog => "dialog",
            Role::NoteToggle => "note-toggle",
            Role::MessageField => "message-field",
            Role::SendAffordance => "send-affordance",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Element resolution result
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Resolved element
    pub element: ElementRef,

    /// Role that was resolved
    pub role: Role,

    /// Strategy that produced the match
    pub strategy: LocatorStrategy,

    /// Visible text of the match, for logging and name extraction
    pub text: String,
}
