//! Tree cloner
//!
//! Duplicates a source tree node by node, skipping subtrees the filter
//! rejects, and hands every finished clone to the [`Snapshotter`]. Children
//! are cloned as an ordered set of futures and joined before the parent is
//! snapshotted, so sibling order always matches the source.

use crate::dom::{NodeKind, VisualNode};
use crate::host::Host;
use crate::rendering::Surface;
use crate::snapshot::Snapshotter;
use futures::future::{join_all, FutureExt, LocalBoxFuture};
use log::{trace, warn};

/// Node inclusion predicate
pub type NodeFilter = dyn Fn(&VisualNode) -> bool + Send + Sync;

// HTML defaults for a canvas without explicit size
const DEFAULT_CANVAS_WIDTH: u32 = 300;
const DEFAULT_CANVAS_HEIGHT: u32 = 150;

pub struct TreeCloner<'a> {
    snapshotter: Snapshotter<'a>,
    filter: Option<&'a NodeFilter>,
}

impl<'a> TreeCloner<'a> {
    pub fn new(host: &'a dyn Host, filter: Option<&'a NodeFilter>) -> Self {
        Self {
            snapshotter: Snapshotter::new(host),
            filter,
        }
    }

    /// Clone `node` and its accepted descendants. Returns `None` when the
    /// filter rejects the node or it has no clonable representation.
    pub fn clone_node<'s>(&'s self, node: &'s VisualNode) -> LocalBoxFuture<'s, Option<VisualNode>> {
        async move {
            if let Some(filter) = self.filter {
                if !filter(node) {
                    trace!("filter rejected <{}>", node.tag);
                    return None;
                }
            }

            let mut clone = make_node_copy(node)?;

            // canvas fallback content is not carried into the image
            if !node.children.is_empty() && node.kind() != NodeKind::Canvas {
                let children = join_all(node.children.iter().map(|c| self.clone_node(c))).await;
                clone.children.extend(children.into_iter().flatten());
            }

            self.snapshotter.process(node, &mut clone);
            Some(clone)
        }
        .boxed_local()
    }
}

fn make_node_copy(node: &VisualNode) -> Option<VisualNode> {
    match node.kind() {
        NodeKind::Canvas => canvas_image(node),
        _ => Some(node.shallow_copy()),
    }
}

/// An `<img>` showing the canvas' current pixels
fn canvas_image(node: &VisualNode) -> Option<VisualNode> {
    let encoded = match &node.surface {
        Some(surface) => surface.to_data_url(),
        None => {
            let width = attribute_u32(node, "width").unwrap_or(DEFAULT_CANVAS_WIDTH);
            let height = attribute_u32(node, "height").unwrap_or(DEFAULT_CANVAS_HEIGHT);
            Surface::new(width, height).and_then(|s| s.to_data_url())
        }
    };
    match encoded {
        Ok(uri) => Some(VisualNode::element("img").with_attribute("src", &uri)),
        Err(e) => {
            warn!("skipping canvas that cannot be snapshotted: {}", e);
            None
        }
    }
}

fn attribute_u32(node: &VisualNode, name: &str) -> Option<u32> {
    node.attribute(name)?.trim().parse().ok()
}
