//! Visual tree nodes
//!
//! A [`VisualNode`] is used both for the live source tree handed in by the
//! host and for the clone the pipeline builds from it. Node kinds are derived
//! once from the tag and namespace (see [`NodeKind`]).

use crate::rendering::Surface;
use crate::style::StyleDeclaration;
use std::sync::atomic::{AtomicU64, Ordering};

pub const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

pub const TEXT_TAG: &str = "#text";
pub const COMMENT_TAG: &str = "#comment";

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique node identity. Clones always get a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
}

impl Namespace {
    pub fn uri(&self) -> &'static str {
        match self {
            Namespace::Html => XHTML_NS,
            Namespace::Svg => SVG_NS,
        }
    }
}

/// The closed set of node kinds the pipeline treats differently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Text,
    Comment,
    Element,
    /// Raster surface; cloned as an image of its current pixels
    Canvas,
    /// Multi-line text input
    TextArea,
    /// Single-line input
    TextInput,
    /// Any element in the SVG namespace
    Vector { rect: bool },
}

/// A node of a visual tree
#[derive(Debug)]
pub struct VisualNode {
    id: NodeId,
    pub tag: String,
    pub namespace: Namespace,
    /// Attributes in document order. `style` is kept in [`VisualNode::style`].
    pub attributes: Vec<(String, String)>,
    /// Inline style declarations
    pub style: StyleDeclaration,
    pub children: Vec<VisualNode>,
    /// Payload of text and comment nodes
    pub text: Option<String>,
    /// Current value of a form control, as opposed to its default attribute
    pub value: Option<String>,
    /// Current pixels of a canvas
    pub surface: Option<Surface>,
}

impl VisualNode {
    fn new(tag: String, namespace: Namespace) -> Self {
        Self {
            id: NodeId::next(),
            tag,
            namespace,
            attributes: Vec::new(),
            style: StyleDeclaration::new(),
            children: Vec::new(),
            text: None,
            value: None,
            surface: None,
        }
    }

    /// An HTML element; the tag is lowercased
    pub fn element(tag: &str) -> Self {
        Self::new(tag.to_ascii_lowercase(), Namespace::Html)
    }

    /// An element in the SVG namespace; tag case is preserved (`foreignObject`)
    pub fn svg_element(tag: &str) -> Self {
        Self::new(tag.to_string(), Namespace::Svg)
    }

    pub fn text(content: impl Into<String>) -> Self {
        let mut node = Self::new(TEXT_TAG.to_string(), Namespace::Html);
        node.text = Some(content.into());
        node
    }

    pub fn comment(content: impl Into<String>) -> Self {
        let mut node = Self::new(COMMENT_TAG.to_string(), Namespace::Html);
        node.text = Some(content.into());
        node
    }

    /// A canvas element holding `surface` as its current pixels
    pub fn canvas(surface: Surface) -> Self {
        let mut node = Self::element("canvas");
        node.set_attribute("width", &surface.width().to_string());
        node.set_attribute("height", &surface.height().to_string());
        node.surface = Some(surface);
        node
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        match self.tag.as_str() {
            TEXT_TAG => NodeKind::Text,
            COMMENT_TAG => NodeKind::Comment,
            tag if self.namespace == Namespace::Svg => NodeKind::Vector {
                rect: tag == "rect",
            },
            "canvas" => NodeKind::Canvas,
            "textarea" => NodeKind::TextArea,
            "input" => NodeKind::TextInput,
            _ => NodeKind::Element,
        }
    }

    pub fn is_element(&self) -> bool {
        !matches!(self.kind(), NodeKind::Text | NodeKind::Comment)
    }

    /// Copy identity, attributes, inline style and payloads, but no children
    pub fn shallow_copy(&self) -> Self {
        Self {
            id: NodeId::next(),
            tag: self.tag.clone(),
            namespace: self.namespace,
            attributes: self.attributes.clone(),
            style: self.style.clone(),
            children: Vec::new(),
            text: self.text.clone(),
            value: self.value.clone(),
            surface: self.surface.clone(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        if name.eq_ignore_ascii_case("style") {
            return None;
        }
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing one in place. Setting `style`
    /// replaces the inline declarations instead.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        if name.eq_ignore_ascii_case("style") {
            self.style.set_css_text(value);
            return;
        }
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let idx = self.attributes.iter().position(|(k, _)| k == name)?;
        Some(self.attributes.remove(idx).1)
    }

    pub fn class_list(&self) -> Vec<&str> {
        self.attribute("class")
            .map(|c| c.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    /// Add a class token unless already present
    pub fn add_class(&mut self, token: &str) {
        let mut classes = self.class_list();
        if classes.contains(&token) {
            return;
        }
        classes.push(token);
        let joined = classes.join(" ");
        self.set_attribute("class", &joined);
    }

    pub fn append_child(&mut self, child: VisualNode) {
        self.children.push(child);
    }

    /// Replace all children with a single text node
    pub fn set_text_content(&mut self, content: &str) {
        self.children.clear();
        if !content.is_empty() {
            self.children.push(VisualNode::text(content));
        }
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self) -> String {
        match self.kind() {
            NodeKind::Text => self.text.clone().unwrap_or_default(),
            NodeKind::Comment => String::new(),
            _ => self.children.iter().map(VisualNode::text_content).collect(),
        }
    }

    /// Number of nodes in this subtree, including this one
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(VisualNode::node_count).sum::<usize>()
    }

    // Builder helpers

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_style(mut self, name: &str, value: &str) -> Self {
        self.style.set_property(name, value, false);
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn with_child(mut self, child: VisualNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = VisualNode>) -> Self {
        self.children.extend(children);
        self
    }
}
