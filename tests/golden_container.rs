use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use domshot::container::parse_data_uri;
use domshot::host::StaticHost;
use domshot::{Options, Renderer, VisualNode};

fn golden_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from("tests/goldens/expected");
    p.push(name);
    p
}

fn card() -> VisualNode {
    VisualNode::element("div")
        .with_attribute("class", "card")
        .with_children([
            VisualNode::element("h1").with_child(VisualNode::text("Title & more")),
            VisualNode::svg_element("svg").with_child(
                VisualNode::svg_element("rect")
                    .with_attribute("width", "10")
                    .with_attribute("height", "5"),
            ),
            VisualNode::element("input")
                .with_attribute("value", "")
                .with_value("typed"),
            VisualNode::text("tail"),
        ])
}

#[tokio::test]
async fn golden_container_matches_fixture() {
    let node = card();
    let host = StaticHost::new();
    let renderer = Renderer::new(&host).with_settle_delay(Duration::ZERO);
    let options = Options::default().with_size(120, 40).with_bgcolor("#fff");

    let uri = renderer.to_svg(&node, &options).await.expect("container");
    let svg = String::from_utf8(parse_data_uri(&uri).expect("data uri").data).expect("utf-8");

    let expected_path = golden_path("card.svg");
    if std::env::var("UPDATE_GOLDENS").is_ok() {
        fs::create_dir_all("tests/goldens/expected").ok();
        fs::write(&expected_path, format!("{}\n", svg)).expect("write golden");
        println!("Updated golden: {:?}", expected_path);
        return;
    }

    if !expected_path.exists() {
        println!(
            "No golden at {:?}; run with UPDATE_GOLDENS=1 to create it. Skipping.",
            expected_path
        );
        return;
    }

    let expected = fs::read_to_string(&expected_path).expect("unable to read golden");
    assert_eq!(svg, expected.trim_end());
}
