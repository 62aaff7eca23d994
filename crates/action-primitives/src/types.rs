//! DOM snapshot model
//!
//! A surface describes itself as a flat list of candidate elements annotated
//! with the regions they sit in. Locator strategies work purely on this data,
//! so they can be exercised against fixture snapshots without a browser.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Stable reference to an element inside one snapshot's surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef(pub String);

impl std::fmt::Display for ElementRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

bitflags! {
    /// Regions an element is contained in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ScopeFlags: u16 {
        /// Inside the `main` landmark.
        const MAIN = 1 << 0;
        /// Inside the subject's primary (top card) region.
        const PRIMARY = 1 << 1;
        /// Inside any modal dialog container.
        const DIALOG = 1 << 2;
        /// Inside the invitation dialog specifically.
        const INVITE = 1 << 3;
        /// Inside an open "more actions" disclosure menu.
        const MENU = 1 << 4;
        /// Element is itself a dialog root.
        const DIALOG_ROOT = 1 << 5;
    }
}

/// One candidate element as seen by the locator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub node: ElementRef,
    /// Lowercase tag name.
    pub tag: String,
    pub role: Option<String>,
    pub aria_label: Option<String>,
    /// Trimmed visible text.
    pub text: String,
    /// Text of the inner button-label span, when the element has one.
    pub label_text: Option<String>,
    pub classes: Vec<String>,
    pub dom_id: Option<String>,
    pub name: Option<String>,
    /// `data-test-modal-id`, carried on dialog roots.
    pub modal_id: Option<String>,
    pub value: Option<String>,
    pub visible: bool,
    pub disabled: bool,
    pub scopes: ScopeFlags,
}

impl ElementNode {
    pub fn new(node: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            node: ElementRef(node.into()),
            tag: tag.into().to_ascii_lowercase(),
            role: None,
            aria_label: None,
            text: String::new(),
            label_text: None,
            classes: Vec::new(),
            dom_id: None,
            name: None,
            modal_id: None,
            value: None,
            visible: true,
            disabled: false,
            scopes: ScopeFlags::MAIN,
        }
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    pub fn with_aria_label(mut self, label: &str) -> Self {
        self.aria_label = Some(label.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.trim().to_string();
        self
    }

    pub fn with_label_text(mut self, text: &str) -> Self {
        self.label_text = Some(text.trim().to_string());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.extend(class.split_whitespace().map(str::to_string));
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.dom_id = Some(id.to_string());
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_modal_id(mut self, id: &str) -> Self {
        self.modal_id = Some(id.to_string());
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn in_scope(mut self, scopes: ScopeFlags) -> Self {
        self.scopes |= scopes;
        self
    }

    /// Replace the scope set entirely (e.g. for elements outside `main`).
    pub fn only_in(mut self, scopes: ScopeFlags) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn has_class_containing(&self, fragment: &str) -> bool {
        self.classes.iter().any(|c| c.contains(fragment))
    }

    pub fn aria_lower(&self) -> String {
        self.aria_label
            .as_deref()
            .unwrap_or_default()
            .to_lowercase()
    }

    pub fn text_lower(&self) -> String {
        self.text.to_lowercase()
    }

    /// Button caption: the label span when present, else the element text.
    pub fn caption_lower(&self) -> String {
        self.label_text
            .as_deref()
            .unwrap_or(&self.text)
            .trim()
            .to_lowercase()
    }

    pub fn is_in(&self, scope: ScopeFlags) -> bool {
        self.scopes.contains(scope)
    }

    pub fn is_actionable(&self) -> bool {
        self.visible && !self.disabled
    }
}

/// Point-in-time view of a surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomSnapshot {
    pub url: Option<String>,
    /// Whether the `main` landmark exists yet.
    pub has_main: bool,
    pub elements: Vec<ElementNode>,
}

impl DomSnapshot {
    pub fn new(has_main: bool, elements: Vec<ElementNode>) -> Self {
        Self {
            url: None,
            has_main,
            elements,
        }
    }

    pub fn get(&self, node: &ElementRef) -> Option<&ElementNode> {
        self.elements.iter().find(|el| &el.node == node)
    }

    /// Elements contained in every region of `scope`, in document order.
    pub fn find_all_in_scope(&self, scope: ScopeFlags) -> impl Iterator<Item = &ElementNode> {
        self.elements.iter().filter(move |el| el.is_in(scope))
    }

    /// Whether any element carries the primary-region flag.
    pub fn has_primary_region(&self) -> bool {
        self.elements.iter().any(|el| el.is_in(ScopeFlags::PRIMARY))
    }
}
