//! HTML fragment front end
//!
//! Builds a [`VisualNode`] tree from markup using `scraper`, and provides
//! [`InlineStyleHost`], a host that treats each element's inline style as its
//! resolved style. This is enough to snapshot static markup without a layout
//! engine.

use crate::dom::{VisualNode, SVG_NS};
use crate::host::Host;
use crate::style::{ComputedStyle, PseudoElement};
use crate::{Error, Result};
use scraper::{ElementRef, Html};

/// Parse `html` as a fragment and return its first top-level element
pub fn parse_fragment(html: &str) -> Result<VisualNode> {
    let fragment = Html::parse_fragment(html);
    // the fragment parser wraps everything in a synthetic <html> element
    let wrapper = fragment.root_element();
    wrapper
        .children()
        .filter_map(ElementRef::wrap)
        .next()
        .map(convert_element)
        .ok_or_else(|| Error::ConfigError("fragment contains no element".into()))
}

fn convert_element(el: ElementRef) -> VisualNode {
    let value = el.value();
    let mut node = if &*value.name.ns == SVG_NS {
        VisualNode::svg_element(value.name())
    } else {
        VisualNode::element(value.name())
    };
    for (name, v) in value.attrs() {
        node.set_attribute(name, v);
    }

    for child in el.children() {
        match child.value() {
            scraper::Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    node.append_child(convert_element(child_el));
                }
            }
            scraper::Node::Text(text) => node.append_child(VisualNode::text(&**text)),
            scraper::Node::Comment(comment) => {
                node.append_child(VisualNode::comment(&**comment))
            }
            _ => {}
        }
    }

    // markup only carries defaults; treat them as the current values
    match node.tag.as_str() {
        "input" => node.value = node.attribute("value").map(str::to_string),
        "textarea" => node.value = Some(node.text_content()),
        _ => {}
    }
    node
}

/// Host answering from inline styles and explicit sizes
#[derive(Debug, Clone, Copy)]
pub struct InlineStyleHost {
    viewport_width: u32,
    viewport_height: u32,
}

impl Default for InlineStyleHost {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl InlineStyleHost {
    /// `width`/`height` are used for nodes without an explicit size
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            viewport_width,
            viewport_height,
        }
    }

    fn measure(&self, node: &VisualNode, name: &str, fallback: u32) -> u32 {
        node.style
            .get_property_value(name)
            .and_then(parse_px)
            .or_else(|| node.attribute(name).and_then(parse_px))
            .unwrap_or(fallback)
    }
}

impl Host for InlineStyleHost {
    fn computed_style(
        &self,
        node: &VisualNode,
        pseudo: Option<PseudoElement>,
    ) -> Option<ComputedStyle> {
        if pseudo.is_some() || node.style.is_empty() {
            return None;
        }
        Some(ComputedStyle::from_css_text(&node.style.css_text()))
    }

    fn measure_width(&self, node: &VisualNode) -> u32 {
        self.measure(node, "width", self.viewport_width)
    }

    fn measure_height(&self, node: &VisualNode) -> u32 {
        self.measure(node, "height", self.viewport_height)
    }
}

/// `12`, `12px` or `12.5px`; other units are not resolved
fn parse_px(value: &str) -> Option<u32> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    let n: f32 = number.parse().ok()?;
    if n.is_finite() && n >= 0.0 {
        Some(n.round() as u32)
    } else {
        None
    }
}
