use criterion::{criterion_group, criterion_main, Criterion};
use std::time::Duration;

use domshot::host::StaticHost;
use domshot::serialize::serialize;
use domshot::style::{ComputedStyle, PseudoElement, StyleDeclaration};
use domshot::{Options, Renderer, VisualNode};

fn list(items: usize) -> VisualNode {
    VisualNode::element("ul").with_children((0..items).map(|i| {
        VisualNode::element("li")
            .with_attribute("data-i", &i.to_string())
            .with_child(VisualNode::text(format!("item {}", i)))
    }))
}

fn styled_host(root: &VisualNode) -> StaticHost {
    let mut host = StaticHost::new();
    host.set_size(root, 200, 400);
    for item in &root.children {
        host.set_style(
            item,
            ComputedStyle::from_css_text("display: list-item; color: rgb(0, 0, 0); margin: 0px;"),
        )
        .set_pseudo_style(
            item,
            PseudoElement::Before,
            ComputedStyle::from_properties(StyleDeclaration::parse("content: \"*\"")),
        );
    }
    host
}

fn bench_snapshot(c: &mut Criterion) {
    let root = list(200);
    let host = styled_host(&root);
    let renderer = Renderer::new(&host).with_settle_delay(Duration::ZERO);
    let options = Options::default();
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    c.bench_function("snapshot_200_items", |b| {
        b.iter(|| {
            let clone = rt.block_on(renderer.snapshot(&root, &options)).unwrap();
            assert_eq!(clone.children.len(), 200);
        })
    });

    let clone = rt.block_on(renderer.snapshot(&root, &options)).unwrap();
    c.bench_function("serialize_200_items", |b| {
        b.iter(|| {
            let _ = serialize(&clone).unwrap();
        })
    });
}

fn bench_raster(c: &mut Criterion) {
    let root = list(20);
    let host = styled_host(&root);
    let renderer = Renderer::new(&host).with_settle_delay(Duration::ZERO);
    let options = Options::default().with_bgcolor("white");
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    c.bench_function("to_png_200x400", |b| {
        b.iter(|| {
            let _ = rt.block_on(renderer.to_png(&root, &options)).unwrap();
        })
    });
}

criterion_group!(benches, bench_snapshot, bench_raster);
criterion_main!(benches);
