//! The host environment a live tree is rendered in
//!
//! The pipeline never resolves styles or measures boxes itself; it asks a
//! [`Host`] for the point-in-time values. [`StaticHost`] is a table-backed
//! host used by tests, benches and callers that captured styles up front.

use crate::dom::{NodeId, VisualNode};
use crate::rendering::layout::LayoutBox;
use crate::style::{ComputedStyle, PseudoElement};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Synchronous style and layout queries against the source tree
pub trait Host {
    /// Resolved style of `node`, or of one of its pseudo-elements
    fn computed_style(&self, node: &VisualNode, pseudo: Option<PseudoElement>)
        -> Option<ComputedStyle>;

    /// Measured width, used when the caller does not supply one
    fn measure_width(&self, node: &VisualNode) -> u32;

    /// Measured height, used when the caller does not supply one
    fn measure_height(&self, node: &VisualNode) -> u32;
}

/// Resolved styles for one element and its generated-content pseudos, in the
/// shape used by JSON fixtures
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleFixture {
    #[serde(default)]
    pub element: Option<ComputedStyle>,
    #[serde(default)]
    pub before: Option<ComputedStyle>,
    #[serde(default)]
    pub after: Option<ComputedStyle>,
}

/// A host answering from pre-recorded tables keyed by [`NodeId`]
#[derive(Debug, Default)]
pub struct StaticHost {
    styles: HashMap<(NodeId, Option<PseudoElement>), ComputedStyle>,
    boxes: HashMap<NodeId, LayoutBox>,
}

impl StaticHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_style(&mut self, node: &VisualNode, style: ComputedStyle) -> &mut Self {
        self.styles.insert((node.id(), None), style);
        self
    }

    pub fn set_pseudo_style(
        &mut self,
        node: &VisualNode,
        pseudo: PseudoElement,
        style: ComputedStyle,
    ) -> &mut Self {
        self.styles.insert((node.id(), Some(pseudo)), style);
        self
    }

    pub fn set_fixture(&mut self, node: &VisualNode, fixture: StyleFixture) -> &mut Self {
        if let Some(style) = fixture.element {
            self.set_style(node, style);
        }
        if let Some(style) = fixture.before {
            self.set_pseudo_style(node, PseudoElement::Before, style);
        }
        if let Some(style) = fixture.after {
            self.set_pseudo_style(node, PseudoElement::After, style);
        }
        self
    }

    pub fn set_box(&mut self, node: &VisualNode, layout: LayoutBox) -> &mut Self {
        self.boxes.insert(node.id(), layout);
        self
    }

    /// Shorthand for a borderless box of `width`×`height`
    pub fn set_size(&mut self, node: &VisualNode, width: u32, height: u32) -> &mut Self {
        self.set_box(node, LayoutBox::sized(width, height))
    }
}

impl Host for StaticHost {
    fn computed_style(
        &self,
        node: &VisualNode,
        pseudo: Option<PseudoElement>,
    ) -> Option<ComputedStyle> {
        self.styles.get(&(node.id(), pseudo)).cloned()
    }

    fn measure_width(&self, node: &VisualNode) -> u32 {
        self.boxes
            .get(&node.id())
            .map(LayoutBox::outer_width)
            .unwrap_or(0)
    }

    fn measure_height(&self, node: &VisualNode) -> u32 {
        self.boxes
            .get(&node.id())
            .map(LayoutBox::outer_height)
            .unwrap_or(0)
    }
}
