use std::fs;

use domshot::host::StaticHost;
use domshot::snapshot::Snapshotter;
use domshot::style::{ComputedStyle, PseudoElement, StyleDeclaration};
use domshot::VisualNode;
use serde::Deserialize;

#[derive(Deserialize)]
struct Fixture {
    name: String,
    css_text: String,
    property: String,
    expected: String,
    important: bool,
    #[serde(default)]
    content: Option<String>,
}

fn load() -> Vec<Fixture> {
    let data =
        fs::read_to_string("tests/computed_style_golden.json").expect("Failed to read fixtures");
    serde_json::from_str(&data).expect("Invalid JSON")
}

/// Snapshot a node carrying its own inline style, whose resolved style is `style`
fn snapshot(style: ComputedStyle, pseudo: Option<ComputedStyle>) -> VisualNode {
    let node = VisualNode::element("span")
        .with_style("z-index", "3")
        .with_style("color", "green");
    let mut host = StaticHost::new();
    host.set_style(&node, style);
    if let Some(p) = pseudo {
        host.set_pseudo_style(&node, PseudoElement::Before, p);
    }
    let mut clone = node.shallow_copy();
    Snapshotter::new(&host).process(&node, &mut clone);
    clone
}

#[test]
fn test_computed_style_golden() {
    for f in load() {
        let with_text = ComputedStyle::from_css_text(&f.css_text);
        let with_props = ComputedStyle::from_properties(StyleDeclaration::parse(&f.css_text));

        let a = snapshot(with_text, None);
        let b = snapshot(with_props, None);

        assert_eq!(
            a.style.get_property_value(&f.property),
            Some(f.expected.as_str()),
            "Mismatch for fixture {} property {}",
            f.name,
            f.property
        );
        assert_eq!(
            a.style.get_property_priority(&f.property),
            f.important,
            "Priority mismatch for fixture {}",
            f.name
        );
        assert_eq!(a.style, b.style, "Strategies disagree for fixture {}", f.name);
        assert_eq!(
            a.style.get_property_value("z-index"),
            None,
            "Inline style leaked through for fixture {}",
            f.name
        );
    }
}

#[test]
fn test_pseudo_rules_agree_across_strategies() {
    for f in load() {
        let Some(content) = f.content else { continue };
        let text = format!("{} content: {};", f.css_text, content);

        let a = snapshot(
            ComputedStyle::default(),
            Some(ComputedStyle::from_css_text(&text)),
        );
        let b = snapshot(
            ComputedStyle::default(),
            Some(ComputedStyle::from_properties(StyleDeclaration::parse(&text))),
        );

        let rule = |n: &VisualNode| {
            let token = n.class_list()[0].to_string();
            let css = n.children[0].text_content();
            // drop the selector so the per-call tokens do not matter
            let body = css
                .strip_prefix(&format!(".{}:before", token))
                .expect("rule selector")
                .to_string();
            StyleDeclaration::parse(body.trim_matches(|c| c == '{' || c == '}'))
        };
        let (ra, rb) = (rule(&a), rule(&b));
        assert_eq!(ra, rb, "Pseudo rules disagree for fixture {}", f.name);
        assert_eq!(ra.get_property_value("content"), Some(content.as_str()));
    }
}
