//! domshot
//!
//! Snapshot a node of a live document tree into an SVG `foreignObject`
//! container and rasterize it into PNG, JPEG, blob or raw pixel output.
//!
//! # Pipeline
//!
//! - **Clone**: the subtree is duplicated node by node, honoring a caller filter
//! - **Snapshot**: resolved style, `::before`/`::after` content, form values
//!   and SVG quirks are frozen onto each clone
//! - **Inline**: fonts and images are embedded through pluggable inliners
//! - **Container**: the clone is serialized as XHTML into a
//!   `data:image/svg+xml` URI
//! - **Raster**: the container is decoded and drawn onto a surface
//!
//! # Example
//!
//! ```no_run
//! use domshot::{host::StaticHost, Options, Renderer, VisualNode};
//!
//! # async fn run() -> domshot::Result<()> {
//! let node = VisualNode::element("div").with_child(VisualNode::text("hello"));
//! let mut host = StaticHost::new();
//! host.set_size(&node, 200, 100);
//!
//! let renderer = Renderer::new(&host);
//! let png = renderer
//!     .to_png(&node, &Options::default().with_bgcolor("white"))
//!     .await?;
//! assert!(!png.is_empty());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

pub mod error;
pub use error::{Error, Result};

pub mod clone;
pub mod container;
pub mod dom;
pub mod host;
pub mod inline;
pub mod pipeline;
pub mod rendering;
pub mod serialize;
pub mod snapshot;
pub mod style;

// HTML fragment front end (scraper)
#[cfg(feature = "html")]
pub mod html;

pub use clone::NodeFilter;
pub use dom::VisualNode;
pub use host::Host;
pub use pipeline::{Renderer, Stage};
pub use rendering::{Blob, Surface};
pub use style::StyleDeclaration;

/// Shared node filter
pub type Filter = Arc<NodeFilter>;

/// Per-call conversion options
///
/// Every field is optional; the defaults render the node at its measured
/// size on a transparent background.
///
/// # Examples
///
/// ```
/// let opts = domshot::Options::default()
///     .with_size(320, 200)
///     .with_bgcolor("#fff");
/// assert_eq!(opts.width, Some(320));
/// assert_eq!(opts.jpeg_quality(), 1.0);
/// ```
#[derive(Clone, Default)]
pub struct Options {
    /// Output width in pixels; also applied to the clone root as `width`
    pub width: Option<u32>,
    /// Output height in pixels; also applied to the clone root as `height`
    pub height: Option<u32>,
    /// Extra declarations merged onto the clone root
    pub style: StyleDeclaration,
    /// Background color for the clone root and the target surface
    pub bgcolor: Option<String>,
    /// JPEG quality in `0.0..=1.0`
    pub quality: Option<f32>,
    /// Data URI substituted for images that fail to load
    pub image_placeholder: Option<String>,
    /// Append a timestamp to fetched image URLs
    pub cache_bust: bool,
    /// Node inclusion predicate; rejected nodes are dropped with their subtree
    pub filter: Option<Filter>,
}

impl Options {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_bgcolor(mut self, color: impl Into<String>) -> Self {
        self.bgcolor = Some(color.into());
        self
    }

    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_style(mut self, style: StyleDeclaration) -> Self {
        self.style = style;
        self
    }

    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&VisualNode) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn with_image_placeholder(mut self, data_uri: impl Into<String>) -> Self {
        self.image_placeholder = Some(data_uri.into());
        self
    }

    pub fn with_cache_bust(mut self, enabled: bool) -> Self {
        self.cache_bust = enabled;
        self
    }

    /// Effective JPEG quality. Unset or non-positive means full quality.
    pub fn jpeg_quality(&self) -> f32 {
        match self.quality {
            Some(q) if q > 0.0 => q.min(1.0),
            _ => 1.0,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("style", &self.style.css_text())
            .field("bgcolor", &self.bgcolor)
            .field("quality", &self.quality)
            .field("image_placeholder", &self.image_placeholder.is_some())
            .field("cache_bust", &self.cache_bust)
            .field("filter", &self.filter.is_some())
            .finish()
    }
}
