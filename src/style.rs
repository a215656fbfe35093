//! Style declarations, resolved styles and the two ways of copying them
//!
//! Hosts report a node's resolved style either as a single serialized
//! `cssText` string, as an enumerable property list, or both. The snapshotter
//! picks a [`StyleStrategy`] by probing which form is available so that both
//! paths end up with the same declarations on the clone.

use serde::{Deserialize, Serialize};

/// Generated-content pseudo-elements captured by the snapshotter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PseudoElement {
    Before,
    After,
}

impl PseudoElement {
    /// Capture order: `::before` first, then `::after`
    pub const ALL: [PseudoElement; 2] = [PseudoElement::Before, PseudoElement::After];

    pub fn as_str(&self) -> &'static str {
        match self {
            PseudoElement::Before => "before",
            PseudoElement::After => "after",
        }
    }
}

/// A single `name: value [!important]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub important: bool,
}

impl Declaration {
    fn to_css(&self) -> String {
        if self.important {
            format!("{}: {} !important", self.name, self.value)
        } else {
            format!("{}: {}", self.name, self.value)
        }
    }
}

/// An ordered style declaration block, the equivalent of an element's
/// inline `style` object.
///
/// Setting a property that already exists replaces its value and priority in
/// place, keeping the original position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleDeclaration {
    declarations: Vec<Declaration>,
}

impl StyleDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a declaration block such as `color: red; width: 10px !important`.
    ///
    /// Malformed entries (no colon, empty name or value) are dropped.
    pub fn parse(text: &str) -> Self {
        let mut decl = Self::new();
        for entry in split_declarations(text) {
            let Some((name, value)) = entry.split_once(':') else {
                continue;
            };
            let name = normalize_name(name);
            let (value, important) = strip_important(value.trim());
            if name.is_empty() || value.is_empty() {
                continue;
            }
            decl.set_property(&name, value, important);
        }
        decl
    }

    /// Serialized form, e.g. `color: red; width: 10px !important;`
    pub fn css_text(&self) -> String {
        self.declarations
            .iter()
            .map(|d| format!("{};", d.to_css()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Replace every declaration with the parsed contents of `text`
    pub fn set_css_text(&mut self, text: &str) {
        *self = Self::parse(text);
    }

    pub fn set_property(&mut self, name: &str, value: &str, important: bool) {
        let name = normalize_name(name);
        let value = value.trim();
        if value.is_empty() {
            self.remove_property(&name);
            return;
        }
        match self.declarations.iter_mut().find(|d| d.name == name) {
            Some(existing) => {
                existing.value = value.to_string();
                existing.important = important;
            }
            None => self.declarations.push(Declaration {
                name,
                value: value.to_string(),
                important,
            }),
        }
    }

    pub fn get_property_value(&self, name: &str) -> Option<&str> {
        let name = normalize_name(name);
        self.declarations
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }

    /// `true` when the property is declared with `!important`
    pub fn get_property_priority(&self, name: &str) -> bool {
        let name = normalize_name(name);
        self.declarations
            .iter()
            .any(|d| d.name == name && d.important)
    }

    pub fn remove_property(&mut self, name: &str) -> Option<Declaration> {
        let name = normalize_name(name);
        let idx = self.declarations.iter().position(|d| d.name == name)?;
        Some(self.declarations.remove(idx))
    }

    /// Apply every declaration of `other` on top of this block
    pub fn merge(&mut self, other: &StyleDeclaration) {
        for d in other.iter() {
            self.set_property(&d.name, &d.value, d.important);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

impl FromIterator<Declaration> for StyleDeclaration {
    fn from_iter<I: IntoIterator<Item = Declaration>>(iter: I) -> Self {
        let mut decl = StyleDeclaration::new();
        for d in iter {
            decl.set_property(&d.name, &d.value, d.important);
        }
        decl
    }
}

/// The resolved style a host reports for a node (or one of its
/// pseudo-elements) at a single instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedStyle {
    /// Serialized form, when the host exposes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css_text: Option<String>,
    /// Enumerable property view
    #[serde(default)]
    pub properties: StyleDeclaration,
}

impl ComputedStyle {
    /// A style that exposes both forms, derived from the serialized text
    pub fn from_css_text(text: &str) -> Self {
        Self {
            css_text: Some(text.to_string()),
            properties: StyleDeclaration::parse(text),
        }
    }

    /// A style that only exposes the property-by-property view
    pub fn from_properties(properties: StyleDeclaration) -> Self {
        Self {
            css_text: None,
            properties,
        }
    }

    /// Resolved value of a property, looking at the property view first and
    /// then at the serialized text.
    pub fn property_value(&self, name: &str) -> Option<String> {
        if let Some(v) = self.properties.get_property_value(name) {
            return Some(v.to_string());
        }
        self.css_text
            .as_deref()
            .map(StyleDeclaration::parse)
            .and_then(|d| d.get_property_value(name).map(str::to_string))
    }

    fn serialized(&self) -> Option<&str> {
        self.css_text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// One way of transferring a resolved style onto a clone
pub trait StyleStrategy: Sync {
    fn name(&self) -> &'static str;

    /// Copy the resolved style onto the clone's inline declarations
    fn apply(&self, source: &ComputedStyle, target: &mut StyleDeclaration);

    /// Body of a pseudo-element rule (the part between the braces). The
    /// `content` value is always declared explicitly.
    fn rule_body(&self, source: &ComputedStyle, content: &str) -> String;
}

/// Uses the host's single serialized `cssText`
pub struct CssTextStrategy;

/// Walks the enumerable property list, preserving priorities
pub struct PropertyListStrategy;

impl StyleStrategy for CssTextStrategy {
    fn name(&self) -> &'static str {
        "css-text"
    }

    fn apply(&self, source: &ComputedStyle, target: &mut StyleDeclaration) {
        target.set_css_text(source.serialized().unwrap_or_default());
    }

    fn rule_body(&self, source: &ComputedStyle, content: &str) -> String {
        let css = source.serialized().unwrap_or_default().trim();
        // the last declaration of a block may omit its semicolon
        let sep = if css.is_empty() || css.ends_with(';') { "" } else { ";" };
        format!("{}{} content: {};", css, sep, content)
    }
}

impl StyleStrategy for PropertyListStrategy {
    fn name(&self) -> &'static str {
        "property-list"
    }

    fn apply(&self, source: &ComputedStyle, target: &mut StyleDeclaration) {
        *target = StyleDeclaration::new();
        for d in source.properties.iter() {
            target.set_property(&d.name, &d.value, d.important);
        }
    }

    fn rule_body(&self, source: &ComputedStyle, content: &str) -> String {
        let mut body = source
            .properties
            .iter()
            .map(Declaration::to_css)
            .collect::<Vec<_>>()
            .join("; ");
        body.push(';');
        if source.properties.get_property_value("content").is_none() {
            body.push_str(&format!(" content: {};", content));
        }
        body
    }
}

/// Pick the strategy matching the capability the style object exposes
pub fn probe(style: &ComputedStyle) -> &'static dyn StyleStrategy {
    if style.serialized().is_some() {
        &CssTextStrategy
    } else {
        &PropertyListStrategy
    }
}

fn normalize_name(name: &str) -> String {
    let name = name.trim();
    // custom properties are case-sensitive
    if name.starts_with("--") {
        name.to_string()
    } else {
        name.to_ascii_lowercase()
    }
}

fn strip_important(value: &str) -> (&str, bool) {
    if let Some(bang) = value.rfind('!') {
        if value[bang + 1..].trim().eq_ignore_ascii_case("important") {
            return (value[..bang].trim_end(), true);
        }
    }
    (value, false)
}

/// Split on `;` outside of quotes and parentheses
fn split_declarations(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                out.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&text[start..]);
    out.into_iter().filter(|s| !s.trim().is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_order_and_priority() {
        let d = StyleDeclaration::parse("color: red; WIDTH: 10px !important; ; bogus");
        assert_eq!(d.len(), 2);
        assert_eq!(d.get_property_value("width"), Some("10px"));
        assert!(d.get_property_priority("width"));
        assert!(!d.get_property_priority("color"));
        assert_eq!(d.css_text(), "color: red; width: 10px !important;");
    }

    #[test]
    fn parse_ignores_semicolons_inside_strings_and_urls() {
        let d = StyleDeclaration::parse(
            r#"content: "a;b"; background: url(data:image/png;base64,AAA=)"#,
        );
        assert_eq!(d.get_property_value("content"), Some(r#""a;b""#));
        assert_eq!(
            d.get_property_value("background"),
            Some("url(data:image/png;base64,AAA=)")
        );
    }

    #[test]
    fn set_property_replaces_in_place() {
        let mut d = StyleDeclaration::parse("a: 1; b: 2");
        d.set_property("a", "3", true);
        assert_eq!(d.css_text(), "a: 3 !important; b: 2;");
        d.set_property("b", "", false);
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn probe_prefers_serialized_text() {
        let css = ComputedStyle::from_css_text("color: red;");
        assert_eq!(probe(&css).name(), "css-text");

        let props = ComputedStyle::from_properties(StyleDeclaration::parse("color: red"));
        assert_eq!(probe(&props).name(), "property-list");

        let blank = ComputedStyle {
            css_text: Some("  ".into()),
            properties: StyleDeclaration::parse("color: red"),
        };
        assert_eq!(probe(&blank).name(), "property-list");
    }

    #[test]
    fn both_strategies_apply_the_same_declarations() {
        let text = "display: block; color: rgb(0, 0, 0) !important; content: \"x\";";
        let with_text = ComputedStyle::from_css_text(text);
        let with_props = ComputedStyle::from_properties(StyleDeclaration::parse(text));

        let mut a = StyleDeclaration::new();
        CssTextStrategy.apply(&with_text, &mut a);
        let mut b = StyleDeclaration::new();
        PropertyListStrategy.apply(&with_props, &mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn strategies_replace_existing_inline_style() {
        let inline = StyleDeclaration::parse("color: blue; margin: 3px");
        let with_text = ComputedStyle::from_css_text("display: block;");
        let with_props = ComputedStyle::from_properties(StyleDeclaration::parse("display: block"));

        let mut a = inline.clone();
        CssTextStrategy.apply(&with_text, &mut a);
        let mut b = inline;
        PropertyListStrategy.apply(&with_props, &mut b);
        assert_eq!(a, b);
        assert_eq!(b.css_text(), "display: block;");
    }

    #[test]
    fn css_text_without_trailing_semicolon_keeps_content_separate() {
        let style = ComputedStyle::from_css_text("color: blue; content: \"x\"");
        let body = CssTextStrategy.rule_body(&style, "\"x\"");
        assert_eq!(body, "color: blue; content: \"x\"; content: \"x\";");
        let parsed = StyleDeclaration::parse(&body);
        assert_eq!(parsed.get_property_value("content"), Some("\"x\""));
        assert_eq!(parsed.get_property_value("color"), Some("blue"));
    }

    #[test]
    fn rule_bodies_always_declare_content() {
        let props = ComputedStyle::from_properties(StyleDeclaration::parse("color: blue"));
        let body = PropertyListStrategy.rule_body(&props, "\"hi\"");
        assert_eq!(body, "color: blue; content: \"hi\";");

        let text = ComputedStyle::from_css_text("color: blue;");
        let body = CssTextStrategy.rule_body(&text, "\"hi\"");
        assert_eq!(body, "color: blue; content: \"hi\";");
    }

    #[test]
    fn property_value_falls_back_to_serialized_text() {
        let style = ComputedStyle {
            css_text: Some("content: none;".into()),
            properties: StyleDeclaration::new(),
        };
        assert_eq!(style.property_value("content").as_deref(), Some("none"));
        assert_eq!(style.property_value("color"), None);
    }
}
