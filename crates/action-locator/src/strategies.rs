//! Per-role strategy tables
//!
//! Every role maps to an ordered list of steps. A step names the strategy it
//! belongs to, the region it searches (`None` searches the whole surface) and
//! a pure predicate over a snapshot element. Steps run in the order:
//! 1. Exact attribute match in the role's region
//! 2. Attribute heuristic in the same region
//! 3. Visible text in the same region, excluding negation markers
//! 4. Unscoped fallback, only for roles that allow it

use action_primitives::{ElementNode, ScopeFlags};

use crate::types::LocatorStrategy::{AttributeHeuristic, ExactAttribute, Unscoped, VisibleText};
use crate::types::{LocatorStrategy, Role};

/// One step of a role's fallback chain.
#[derive(Clone, Copy)]
pub struct StrategyStep {
    pub strategy: LocatorStrategy,
    pub scope: Option<ScopeFlags>,
    pub matches: fn(&ElementNode) -> bool,
}

impl std::fmt::Debug for StrategyStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyStep")
            .field("strategy", &self.strategy)
            .field("scope", &self.scope)
            .finish()
    }
}

const fn step(
    strategy: LocatorStrategy,
    scope: Option<ScopeFlags>,
    matches: fn(&ElementNode) -> bool,
) -> StrategyStep {
    StrategyStep {
        strategy,
        scope,
        matches,
    }
}

const PRIMARY: Option<ScopeFlags> = Some(ScopeFlags::PRIMARY);
const DIALOG: Option<ScopeFlags> = Some(ScopeFlags::DIALOG);
const MENU: Option<ScopeFlags> = Some(ScopeFlags::MENU);
const ANYWHERE: Option<ScopeFlags> = None;

/// Words that disqualify a text match for connect-like roles.
const CONNECT_NEGATIONS: &[&str] = &["disconnect", "remove", "send profile", "cancel"];

/// Captions that disqualify a dialog button from being the send action.
const SEND_NEGATIONS: &[&str] = &["cancel", "close", "dismiss", "add a note"];

/// Phrases that mark a dialog button as the send action wherever they appear
/// in its caption. A bare "send" caption must match exactly.
const SEND_PHRASES: &[&str] = &["send invitation", "send without", "send now"];

static CONNECT_CHAIN: [StrategyStep; 3] = [
    step(ExactAttribute, PRIMARY, connect_exact),
    step(AttributeHeuristic, PRIMARY, connect_heuristic),
    step(VisibleText, PRIMARY, connect_text),
];

static MENU_CONNECT_CHAIN: [StrategyStep; 3] = [
    step(ExactAttribute, MENU, connect_exact),
    step(AttributeHeuristic, MENU, connect_heuristic),
    step(VisibleText, MENU, menu_connect_text),
];

static ANY_CONNECT_CHAIN: [StrategyStep; 1] = [step(Unscoped, ANYWHERE, invite_control)];

static MORE_ACTIONS_CHAIN: [StrategyStep; 3] = [
    step(ExactAttribute, PRIMARY, more_actions_exact),
    step(AttributeHeuristic, PRIMARY, more_actions_heuristic),
    step(VisibleText, PRIMARY, more_actions_text),
];

static REMOVE_CONNECTION_CHAIN: [StrategyStep; 2] = [
    step(AttributeHeuristic, MENU, remove_connection_heuristic),
    step(VisibleText, MENU, remove_connection_text),
];

static PENDING_CHAIN: [StrategyStep; 3] = [
    step(ExactAttribute, PRIMARY, pending_exact),
    step(AttributeHeuristic, PRIMARY, pending_heuristic),
    step(VisibleText, PRIMARY, pending_text),
];

static FOLLOW_CHAIN: [StrategyStep; 2] = [
    step(ExactAttribute, PRIMARY, follow_exact),
    step(Unscoped, ANYWHERE, follow_exact),
];

static DISTANCE_CHAIN: [StrategyStep; 2] = [
    step(ExactAttribute, PRIMARY, distance_badge),
    step(Unscoped, ANYWHERE, distance_badge),
];

static SUBJECT_NAME_CHAIN: [StrategyStep; 4] = [
    step(ExactAttribute, ANYWHERE, name_exact),
    step(AttributeHeuristic, ANYWHERE, name_heuristic),
    step(VisibleText, PRIMARY, name_heading),
    step(Unscoped, ANYWHERE, name_heading),
];

static DIALOG_CHAIN: [StrategyStep; 3] = [
    step(ExactAttribute, DIALOG, dialog_exact),
    step(AttributeHeuristic, ANYWHERE, invite_dialog),
    step(Unscoped, ANYWHERE, dialog_any),
];

static NOTE_TOGGLE_CHAIN: [StrategyStep; 4] = [
    step(ExactAttribute, DIALOG, note_toggle_exact),
    step(AttributeHeuristic, DIALOG, note_toggle_heuristic),
    step(VisibleText, DIALOG, note_toggle_text),
    step(Unscoped, ANYWHERE, note_toggle_exact),
];

static MESSAGE_FIELD_CHAIN: [StrategyStep; 3] = [
    step(ExactAttribute, ANYWHERE, message_field_exact),
    step(AttributeHeuristic, DIALOG, visible_textarea),
    step(Unscoped, ANYWHERE, visible_textarea),
];

static SEND_CHAIN: [StrategyStep; 3] = [
    step(ExactAttribute, DIALOG, send_exact),
    step(AttributeHeuristic, DIALOG, send_heuristic),
    step(VisibleText, DIALOG, send_text),
];

/// Ordered fallback chain for a role.
pub fn chain_for(role: Role) -> &'static [StrategyStep] {
    match role {
        Role::ConnectAffordance => &CONNECT_CHAIN,
        Role::MenuConnect => &MENU_CONNECT_CHAIN,
        Role::AnyConnectControl => &ANY_CONNECT_CHAIN,
        Role::MoreActions => &MORE_ACTIONS_CHAIN,
        Role::RemoveConnection => &REMOVE_CONNECTION_CHAIN,
        Role::PendingIndicator => &PENDING_CHAIN,
        Role::FollowAffordance => &FOLLOW_CHAIN,
        Role::DistanceBadge => &DISTANCE_CHAIN,
        Role::SubjectName => &SUBJECT_NAME_CHAIN,
        Role::Dialog => &DIALOG_CHAIN,
        Role::NoteToggle => &NOTE_TOGGLE_CHAIN,
        Role::MessageField => &MESSAGE_FIELD_CHAIN,
        Role::SendAffordance => &SEND_CHAIN,
    }
}

/// Whether the role may fall back to a whole-surface search.
pub fn allows_unscoped(role: Role) -> bool {
    chain_for(role)
        .iter()
        .any(|step| step.strategy == LocatorStrategy::Unscoped)
}

fn aria(el: &ElementNode) -> &str {
    el.aria_label.as_deref().unwrap_or_default()
}

fn mentions_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

fn is_button(el: &ElementNode) -> bool {
    el.is_tag("button") || el.role.as_deref() == Some("button")
}

// connect

fn connect_exact(el: &ElementNode) -> bool {
    let label = aria(el);
    is_button(el) && label.contains("Invite") && label.contains("to connect")
}

fn connect_heuristic(el: &ElementNode) -> bool {
    let label = el.aria_lower();
    is_button(el)
        && label.contains("invite")
        && label.contains("connect")
        && !mentions_any(&label, CONNECT_NEGATIONS)
}

fn connect_text(el: &ElementNode) -> bool {
    is_button(el) && el.caption_lower() == "connect"
}

fn menu_connect_text(el: &ElementNode) -> bool {
    let text = el.text_lower();
    text.contains("connect") && !mentions_any(&text, CONNECT_NEGATIONS)
}

fn invite_control(el: &ElementNode) -> bool {
    let label = aria(el);
    (el.is_tag("button") || el.is_tag("div")) && label.contains("Invite") && label.contains("connect")
}

// menu and status

fn more_actions_exact(el: &ElementNode) -> bool {
    is_button(el) && aria(el) == "More actions"
}

fn more_actions_heuristic(el: &ElementNode) -> bool {
    is_button(el) && el.aria_lower().contains("more actions")
}

fn more_actions_text(el: &ElementNode) -> bool {
    is_button(el) && el.caption_lower() == "more"
}

fn remove_connection_heuristic(el: &ElementNode) -> bool {
    let label = el.aria_lower();
    label.contains("remove") && label.contains("connection")
}

fn remove_connection_text(el: &ElementNode) -> bool {
    el.text_lower().contains("remove connection")
}

fn pending_exact(el: &ElementNode) -> bool {
    let label = aria(el);
    let lower = label.to_lowercase();
    is_button(el)
        && label.starts_with("Pending")
        && (lower.contains("withdraw") || lower.contains("pending invitation"))
}

fn pending_heuristic(el: &ElementNode) -> bool {
    let label = el.aria_lower();
    is_button(el) && label.starts_with("pending") && label.contains("invitation")
}

fn pending_text(el: &ElementNode) -> bool {
    el.caption_lower() == "pending"
}

fn follow_exact(el: &ElementNode) -> bool {
    let label = aria(el);
    is_button(el) && label.contains("Follow") && !label.contains("Unfollow")
}

fn distance_badge(el: &ElementNode) -> bool {
    el.has_class("dist-value")
}

// name

fn name_exact(el: &ElementNode) -> bool {
    el.is_tag("h1") && el.has_class("text-heading-xlarge") && !el.text.is_empty()
}

fn name_heuristic(el: &ElementNode) -> bool {
    el.is_tag("h1") && el.has_class_containing("text-heading") && !el.text.is_empty()
}

fn name_heading(el: &ElementNode) -> bool {
    el.is_tag("h1") && !el.text.is_empty()
}

// dialog

fn dialog_exact(el: &ElementNode) -> bool {
    el.is_in(ScopeFlags::DIALOG_ROOT) && el.role.as_deref() == Some("dialog")
}

fn invite_dialog(el: &ElementNode) -> bool {
    el.is_in(ScopeFlags::DIALOG_ROOT)
        && (el.has_class("send-invite") || el.modal_id.as_deref() == Some("send-invite-modal"))
}

fn dialog_any(el: &ElementNode) -> bool {
    el.role.as_deref() == Some("dialog")
}

fn note_toggle_exact(el: &ElementNode) -> bool {
    is_button(el) && aria(el) == "Add a note"
}

fn note_toggle_heuristic(el: &ElementNode) -> bool {
    is_button(el) && el.aria_lower() == "add a note"
}

fn note_toggle_text(el: &ElementNode) -> bool {
    is_button(el) && el.text_lower() == "add a note"
}

fn message_field_exact(el: &ElementNode) -> bool {
    el.visible
        && el.is_tag("textarea")
        && (el.dom_id.as_deref() == Some("custom-message")
            || el.name.as_deref() == Some("message")
            || el.has_class("connect-button-send-invite__custom-message"))
}

fn visible_textarea(el: &ElementNode) -> bool {
    el.visible && el.is_tag("textarea")
}

// send

fn send_candidate(el: &ElementNode) -> bool {
    is_button(el)
        && el.is_actionable()
        && el.aria_lower() != "dismiss"
        && !mentions_any(&el.caption_lower(), SEND_NEGATIONS)
}

fn send_exact(el: &ElementNode) -> bool {
    send_candidate(el) && aria(el).contains("Send")
}

fn send_heuristic(el: &ElementNode) -> bool {
    send_candidate(el) && el.aria_lower().contains("send")
}

fn send_text(el: &ElementNode) -> bool {
    if !send_candidate(el) {
        return false;
    }
    let caption = el.caption_lower();
    caption == "send"
        || mentions_any(&caption, SEND_PHRASES)
        || (el.has_class("artdeco-button--primary") && !caption.contains("add"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_role_has_a_chain_in_strategy_order() {
        for role in Role::ALL {
            let chain = chain_for(role);
            assert!(!chain.is_empty(), "{role} has no strategies");
            let order: Vec<_> = LocatorStrategy::fallback_chain();
            let positions: Vec<_> = chain
                .iter()
                .map(|s| order.iter().position(|o| *o == s.strategy).unwrap())
                .collect();
            let mut sorted = positions.clone();
            sorted.sort_unstable();
            assert_eq!(positions, sorted, "{role} steps out of order");
        }
    }

    #[test]
    fn unscoped_fallback_is_limited() {
        assert!(allows_unscoped(Role::MessageField));
        assert!(allows_unscoped(Role::NoteToggle));
        assert!(!allows_unscoped(Role::ConnectAffordance));
        assert!(!allows_unscoped(Role::SendAffordance));
    }

    #[test]
    fn connect_text_rejects_negations_in_menu() {
        let disconnect = ElementNode::new("m1", "div").with_text("Disconnect");
        let connect = ElementNode::new("m2", "div").with_text("Connect");
        assert!(!menu_connect_text(&disconnect));
        assert!(menu_connect_text(&connect));
    }

    #[test]
    fn send_skips_dismiss_and_note_buttons() {
        let dismiss = ElementNode::new("x", "button").with_aria_label("Dismiss");
        let add_note = ElementNode::new("n", "button")
            .with_class("artdeco-button--primary")
            .with_text("Add a note");
        let primary = ElementNode::new("p", "button")
            .with_class("artdeco-button--primary")
            .with_text("Send");
        let disabled = ElementNode::new("d", "button")
            .with_aria_label("Send invitation")
            .disabled();
        assert!(!send_heuristic(&dismiss));
        assert!(!send_text(&add_note));
        assert!(send_text(&primary));
        assert!(!send_exact(&disabled));
    }

    #[test]
    fn send_text_matches_phrases_inside_longer_captions() {
        let longer = ElementNode::new("s1", "button").with_text("Send invitation now");
        let without = ElementNode::new("s2", "button").with_text("Send without a note");
        let resend = ElementNode::new("s3", "button").with_text("Resend");
        assert!(send_text(&longer));
        assert!(send_text(&without));
        assert!(!send_text(&resend));
    }
}
