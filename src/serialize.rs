//! XML serialization of clone trees
//!
//! Produces well-formed XML so the payload can be embedded in an SVG
//! `foreignObject`. HTML void elements are written self-closed, other empty
//! HTML elements get an explicit end tag, empty SVG elements are self-closed.

use crate::dom::{Namespace, NodeKind, VisualNode};
use crate::{Error, Result};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Serialize `node` and its subtree to markup
pub fn serialize(node: &VisualNode) -> Result<String> {
    let mut out = String::new();
    write_node(node, &mut out)?;
    Ok(out)
}

fn write_node(node: &VisualNode, out: &mut String) -> Result<()> {
    match node.kind() {
        NodeKind::Text => {
            out.push_str(&escape_text(node.text.as_deref().unwrap_or_default()));
            Ok(())
        }
        NodeKind::Comment => {
            let text = node.text.as_deref().unwrap_or_default();
            if text.contains("--") || text.ends_with('-') {
                return Err(Error::Serialize(format!(
                    "comment cannot be represented in XML: {:?}",
                    text
                )));
            }
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
            Ok(())
        }
        _ => write_element(node, out),
    }
}

fn write_element(node: &VisualNode, out: &mut String) -> Result<()> {
    check_name(&node.tag)?;
    out.push('<');
    out.push_str(&node.tag);
    for (name, value) in &node.attributes {
        check_name(name)?;
        push_attribute(out, name, value);
    }
    if !node.style.is_empty() {
        push_attribute(out, "style", &node.style.css_text());
    }

    let void = node.namespace == Namespace::Html
        && VOID_ELEMENTS.contains(&node.tag.as_str());
    if node.children.is_empty() {
        if void {
            out.push_str(" />");
            return Ok(());
        }
        if node.namespace == Namespace::Svg {
            out.push_str("/>");
            return Ok(());
        }
    }

    out.push('>');
    for child in &node.children {
        write_node(child, out)?;
    }
    out.push_str("</");
    out.push_str(&node.tag);
    out.push('>');
    Ok(())
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_attribute(value));
    out.push('"');
}

fn check_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '.')
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'));
    if valid {
        Ok(())
    } else {
        Err(Error::Serialize(format!("invalid XML name {:?}", name)))
    }
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\t' => out.push_str("&#9;"),
            c => out.push(c),
        }
    }
    out
}
