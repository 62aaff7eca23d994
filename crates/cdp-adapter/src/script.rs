//! Page-side scripts and the snapshot wire model.
//!
//! The snapshot script tags every candidate element with a
//! `data-outreach-ref` attribute and reports its attributes plus the regions it
//! sits in. Later interaction scripts address elements by that reference.

use action_primitives::{DomSnapshot, ElementNode, ElementRef, ScopeFlags};
use serde::Deserialize;

pub const REF_ATTRIBUTE: &str = "data-outreach-ref";

pub const SNAPSHOT_SCRIPT: &str = r#"(() => {
  const ATTR = 'data-outreach-ref';
  const DIALOG_ROOTS = '#artdeco-modal-outlet [role="dialog"], .artdeco-modal, [role="dialog"], .send-invite, [data-test-modal-id="send-invite-modal"]';
  const DIALOG_AREA = '#artdeco-modal-outlet, .artdeco-modal, [role="dialog"], .send-invite';
  const INVITE_AREA = '[data-test-modal-id="send-invite-modal"], .send-invite';
  const MENU_AREA = '.artdeco-dropdown__content, .artdeco-dropdown__item';
  const CANDIDATES = 'button, [role="button"], textarea, h1, .dist-value, div[aria-label], ' + DIALOG_ROOTS;
  const primary = document.querySelector('.ph5.pb5') || document.querySelector('.pv-top-card') || document.querySelector('main section:first-child');
  const root = document.documentElement;
  let seq = Number(root.getAttribute('data-outreach-seq') || '0');
  const elements = [];
  for (const el of document.querySelectorAll(CANDIDATES)) {
    let ref = el.getAttribute(ATTR);
    if (!ref) {
      seq += 1;
      ref = 'r' + seq;
      el.setAttribute(ATTR, ref);
    }
    const dialog = el.closest(DIALOG_AREA);
    const label = el.querySelector('.artdeco-button__text');
    const fixed = window.getComputedStyle(el).position === 'fixed';
    elements.push({
      ref,
      tag: el.tagName.toLowerCase(),
      role: el.getAttribute('role'),
      ariaLabel: el.getAttribute('aria-label'),
      text: (el.innerText || el.textContent || '').trim(),
      labelText: label ? (label.innerText || label.textContent || '').trim() : null,
      classes: Array.from(el.classList),
      id: el.id || null,
      name: el.getAttribute('name'),
      modalId: el.getAttribute('data-test-modal-id'),
      value: typeof el.value === 'string' ? el.value : null,
      visible: el.offsetParent !== null || fixed,
      disabled: !!el.disabled || el.getAttribute('aria-disabled') === 'true',
      inMain: !!el.closest('main'),
      inPrimary: !!primary && primary.contains(el),
      inDialog: !!dialog,
      inInvite: !!el.closest(INVITE_AREA) || (!!dialog && !!dialog.querySelector('.send-invite')),
      inMenu: !!el.closest(MENU_AREA),
      dialogRoot: el.matches(DIALOG_ROOTS),
    });
  }
  root.setAttribute('data-outreach-seq', String(seq));
  return { url: location.href, hasMain: !!document.querySelector('main'), elements };
})()"#;

const CLICK_FN: &str = r#"(ref) => {
  const el = document.querySelector('[data-outreach-ref=' + JSON.stringify(ref) + ']');
  if (!el) return false;
  el.click();
  return true;
}"#;

const FILL_FN: &str = r#"(ref, text) => {
  const el = document.querySelector('[data-outreach-ref=' + JSON.stringify(ref) + ']');
  if (!el) return false;
  el.focus();
  const proto = el instanceof HTMLTextAreaElement ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype;
  const setter = Object.getOwnPropertyDescriptor(proto, 'value').set;
  setter.call(el, '');
  setter.call(el, text);
  el.dispatchEvent(new Event('input', { bubbles: true }));
  el.dispatchEvent(new Event('change', { bubbles: true }));
  el.dispatchEvent(new KeyboardEvent('keydown', { bubbles: true }));
  el.dispatchEvent(new KeyboardEvent('keyup', { bubbles: true }));
  return true;
}"#;

const READ_FN: &str = r#"(ref) => {
  const el = document.querySelector('[data-outreach-ref=' + JSON.stringify(ref) + ']');
  if (!el) return null;
  return typeof el.value === 'string' ? el.value : '';
}"#;

pub const DISMISS_SCRIPT: &str = "(() => { document.body.click(); return true; })()";

/// Expression invoking `function` with JSON-encoded arguments.
fn invoke(function: &str, args: &[&str]) -> Result<String, serde_json::Error> {
    let encoded = args
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("({function})({})", encoded.join(", ")))
}

pub fn click_expression(element: &ElementRef) -> Result<String, serde_json::Error> {
    invoke(CLICK_FN, &[element.0.as_str()])
}

pub fn fill_expression(element: &ElementRef, text: &str) -> Result<String, serde_json::Error> {
    invoke(FILL_FN, &[element.0.as_str(), text])
}

pub fn read_expression(element: &ElementRef) -> Result<String, serde_json::Error> {
    invoke(READ_FN, &[element.0.as_str()])
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSnapshot {
    pub url: Option<String>,
    pub has_main: bool,
    #[serde(default)]
    pub elements: Vec<RawElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawElement {
    #[serde(rename = "ref")]
    pub reference: String,
    pub tag: String,
    pub role: Option<String>,
    pub aria_label: Option<String>,
    #[serde(default)]
    pub text: String,
    pub label_text: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub modal_id: Option<String>,
    pub value: Option<String>,
    pub visible: bool,
    pub disabled: bool,
    pub in_main: bool,
    pub in_primary: bool,
    pub in_dialog: bool,
    pub in_invite: bool,
    pub in_menu: bool,
    pub dialog_root: bool,
}

impl RawElement {
    fn scopes(&self) -> ScopeFlags {
        let mut scopes = ScopeFlags::empty();
        scopes.set(ScopeFlags::MAIN, self.in_main);
        scopes.set(ScopeFlags::PRIMARY, self.in_primary);
        scopes.set(ScopeFlags::DIALOG, self.in_dialog);
        scopes.set(ScopeFlags::INVITE, self.in_invite);
        scopes.set(ScopeFlags::MENU, self.in_menu);
        scopes.set(ScopeFlags::DIALOG_ROOT, self.dialog_root);
        scopes
    }
}

impl From<RawElement> for ElementNode {
    fn from(raw: RawElement) -> Self {
        let scopes = raw.scopes();
        ElementNode {
            node: ElementRef(raw.reference),
            tag: raw.tag,
            role: raw.role,
            aria_label: raw.aria_label,
            text: raw.text,
            label_text: raw.label_text,
            classes: raw.classes,
            dom_id: raw.id,
            name: raw.name,
            modal_id: raw.modal_id,
            value: raw.value,
            visible: raw.visible,
            disabled: raw.disabled,
            scopes,
        }
    }
}

impl From<RawSnapshot> for DomSnapshot {
    fn from(raw: RawSnapshot) -> Self {
        DomSnapshot {
            url: raw.url,
            has_main: raw.has_main,
            elements: raw.elements.into_iter().map(ElementNode::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_snapshot_maps_region_flags() {
        let raw: RawSnapshot = serde_json::from_value(json!({
            "url": "https://www.linkedin.com/in/ada/",
            "hasMain": true,
            "elements": [{
                "ref": "r4",
                "tag": "button",
                "role": null,
                "ariaLabel": "Send invitation",
                "text": "Send",
                "labelText": "Send",
                "classes": ["artdeco-button", "artdeco-button--primary"],
                "id": null,
                "name": null,
                "modalId": null,
                "value": null,
                "visible": true,
                "disabled": false,
                "inMain": false,
                "inPrimary": false,
                "inDialog": true,
                "inInvite": true,
                "inMenu": false,
                "dialogRoot": false
            }]
        }))
        .unwrap();

        let snapshot = DomSnapshot::from(raw);
        assert!(snapshot.has_main);
        let send = snapshot.get(&ElementRef("r4".into())).unwrap();
        assert_eq!(send.scopes, ScopeFlags::DIALOG | ScopeFlags::INVITE);
        assert!(send.has_class("artdeco-button--primary"));
        assert_eq!(send.caption_lower(), "send");
    }

    #[test]
    fn scripts_share_the_reference_attribute() {
        assert!(SNAPSHOT_SCRIPT.contains(REF_ATTRIBUTE));
        assert!(CLICK_FN.contains(REF_ATTRIBUTE));
        assert!(FILL_FN.contains(REF_ATTRIBUTE));
        assert!(READ_FN.contains(REF_ATTRIBUTE));
    }

    #[test]
    fn arguments_are_json_encoded() {
        let expr = fill_expression(&ElementRef("r1".into()), "Hi \"Ada\"\n").unwrap();
        assert!(expr.ends_with(r#")("r1", "Hi \"Ada\"\n")"#));
        assert!(click_expression(&ElementRef("r9".into()))
            .unwrap()
            .ends_with(r#")("r9")"#));
    }
}
