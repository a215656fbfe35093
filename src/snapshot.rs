//! Presentation snapshotter
//!
//! Runs once per element clone, right after its children are attached, and
//! freezes everything that only exists as live presentation state: resolved
//! style, generated `::before`/`::after` content, current form values, and
//! the namespace/sizing quirks SVG elements need once serialized.

use crate::dom::{NodeKind, VisualNode, SVG_NS};
use crate::host::Host;
use crate::style::{probe, PseudoElement};
use log::trace;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

static NEXT_CLASS_TOKEN: AtomicU64 = AtomicU64::new(0);
static TOKEN_PREFIX: OnceLock<String> = OnceLock::new();

/// Allocate a class token that is unique for the lifetime of the process.
///
/// Tokens are `u` + a fixed-width per-process prefix + a base-36 counter, so
/// two tokens never collide even when conversions interleave.
pub fn next_class_token() -> String {
    let n = NEXT_CLASS_TOKEN.fetch_add(1, Ordering::Relaxed);
    format!("u{}{}", token_prefix(), to_base36(n))
}

fn token_prefix() -> &'static str {
    TOKEN_PREFIX.get_or_init(|| {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos() as u64)
            .unwrap_or(0);
        let seed = (std::process::id() as u64) ^ nanos;
        format!("{:0>4}", to_base36(seed % 36u64.pow(4)))
    })
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// A synthesized `.<token>:<pseudo>{...}` rule standing in for generated content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PseudoStyleRule {
    pub class_token: String,
    pub pseudo: PseudoElement,
    /// Declarations between the braces
    pub body: String,
}

impl PseudoStyleRule {
    pub fn to_css(&self) -> String {
        format!(".{}:{}{{{}}}", self.class_token, self.pseudo.as_str(), self.body)
    }

    /// A `<style>` element holding the rule
    pub fn into_node(self) -> VisualNode {
        let css = self.to_css();
        VisualNode::element("style").with_child(VisualNode::text(css))
    }
}

pub struct Snapshotter<'h> {
    host: &'h dyn Host,
}

impl<'h> Snapshotter<'h> {
    pub fn new(host: &'h dyn Host) -> Self {
        Self { host }
    }

    /// Capture `original`'s presentation state onto `clone`. Only the clone
    /// is mutated; text and comment clones are left as they are.
    pub fn process(&self, original: &VisualNode, clone: &mut VisualNode) {
        if !clone.is_element() {
            return;
        }
        trace!("snapshotting <{}>", original.tag);
        self.copy_style(original, clone);
        for rule in self.pseudo_rules(original) {
            clone.add_class(&rule.class_token);
            clone.append_child(rule.into_node());
        }
        copy_user_input(original, clone);
        fix_svg(clone);
    }

    fn copy_style(&self, original: &VisualNode, clone: &mut VisualNode) {
        let Some(style) = self.host.computed_style(original, None) else {
            return;
        };
        let strategy = probe(&style);
        trace!("copying style of <{}> via {}", original.tag, strategy.name());
        strategy.apply(&style, &mut clone.style);
    }

    /// Rules for every pseudo-element with non-empty generated content, in
    /// `::before`, `::after` order
    pub fn pseudo_rules(&self, original: &VisualNode) -> Vec<PseudoStyleRule> {
        let mut rules = Vec::new();
        for pseudo in PseudoElement::ALL {
            let Some(style) = self.host.computed_style(original, Some(pseudo)) else {
                continue;
            };
            let content = style.property_value("content").unwrap_or_default();
            if content.is_empty() || content == "none" {
                continue;
            }
            rules.push(PseudoStyleRule {
                class_token: next_class_token(),
                pseudo,
                body: probe(&style).rule_body(&style, &content),
            });
        }
        rules
    }
}

fn copy_user_input(original: &VisualNode, clone: &mut VisualNode) {
    let Some(value) = original.value.as_deref() else {
        return;
    };
    match original.kind() {
        NodeKind::TextArea => clone.set_text_content(value),
        NodeKind::TextInput => clone.set_attribute("value", value),
        _ => {}
    }
}

fn fix_svg(clone: &mut VisualNode) {
    let NodeKind::Vector { rect } = clone.kind() else {
        return;
    };
    clone.set_attribute("xmlns", SVG_NS);
    if !rect {
        return;
    }
    for name in ["width", "height"] {
        let Some(value) = clone.attribute(name).map(str::to_string) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        clone.style.set_property(name, &value, false);
    }
}
