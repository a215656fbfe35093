//! The conversion pipeline
//!
//! Each conversion call walks the same states:
//! `Idle → Cloning → Snapshotting → Inlining → Composited → Decoding → Drawn`
//! and ends in `Encoded` or `PixelRead`. A failure at any stage aborts the
//! call; nothing is retried.
//!
//! Cloning and snapshotting are fused: every clone is snapshotted as soon as
//! its children are joined, so both stages are entered together before the
//! tree walk starts.
//!
//! The settle delay goes through a [`Sleeper`]. The default [`TokioSleeper`]
//! needs a Tokio runtime with the time driver; other executors plug in their
//! own timer with [`Renderer::with_sleeper`] or use a zero delay.

use crate::clone::TreeCloner;
use crate::container::make_svg_data_uri;
use crate::dom::VisualNode;
use crate::host::Host;
use crate::inline::{FontInliner, ImageInliner, NoopFontInliner, NoopImageInliner};
use crate::rendering::decode::{ImageDecoder, SvgImageDecoder};
use crate::rendering::{raster, Blob, BlobEncoder, PngBlobEncoder, Surface};
use crate::{Error, Options, Result};
use futures::future::{FutureExt, LocalBoxFuture};
use log::debug;
use std::fmt;
use std::time::Duration;

/// Wait between decode completion and drawing. Decode completion does not
/// guarantee paint readiness on every platform; the exact value is a tunable.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Cloning,
    Snapshotting,
    Inlining,
    Composited,
    Decoding,
    Drawn,
    Encoded,
    PixelRead,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Cloning => "cloning",
            Stage::Snapshotting => "snapshotting",
            Stage::Inlining => "inlining",
            Stage::Composited => "composited",
            Stage::Decoding => "decoding",
            Stage::Drawn => "drawn",
            Stage::Encoded => "encoded",
            Stage::PixelRead => "pixel-read",
        };
        f.write_str(name)
    }
}

fn enter(stage: Stage) {
    debug!("conversion stage: {}", stage);
}

/// Async timer used for the settle delay
pub trait Sleeper {
    fn sleep<'a>(&'a self, delay: Duration) -> LocalBoxFuture<'a, Result<()>>;
}

/// Sleeps on the current Tokio runtime
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep<'a>(&'a self, delay: Duration) -> LocalBoxFuture<'a, Result<()>> {
        async move {
            if tokio::runtime::Handle::try_current().is_err() {
                return Err(Error::ConfigError(
                    "settle delay needs a Tokio runtime; set a sleeper or a zero delay".into(),
                ));
            }
            tokio::time::sleep(delay).await;
            Ok(())
        }
        .boxed_local()
    }
}

/// Converts nodes of a host's tree into SVG containers and images.
///
/// A `Renderer` holds no per-call state, so one instance can serve any
/// number of conversions. With the default [`TokioSleeper`] the drawing
/// operations must run inside a Tokio runtime.
pub struct Renderer<'h> {
    host: &'h dyn Host,
    fonts: Box<dyn FontInliner + 'h>,
    images: Box<dyn ImageInliner + 'h>,
    decoder: Box<dyn ImageDecoder + 'h>,
    blob_encoder: Box<dyn BlobEncoder + 'h>,
    sleeper: Box<dyn Sleeper + 'h>,
    settle_delay: Duration,
}

impl<'h> Renderer<'h> {
    /// A renderer with no-op inliners, the resvg decoder and PNG blobs
    pub fn new(host: &'h dyn Host) -> Self {
        Self {
            host,
            fonts: Box::new(NoopFontInliner),
            images: Box::new(NoopImageInliner),
            decoder: Box::new(SvgImageDecoder),
            blob_encoder: Box::new(PngBlobEncoder),
            sleeper: Box::new(TokioSleeper),
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_font_inliner(mut self, inliner: impl FontInliner + 'h) -> Self {
        self.fonts = Box::new(inliner);
        self
    }

    pub fn with_image_inliner(mut self, inliner: impl ImageInliner + 'h) -> Self {
        self.images = Box::new(inliner);
        self
    }

    pub fn with_decoder(mut self, decoder: impl ImageDecoder + 'h) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    pub fn with_blob_encoder(mut self, encoder: impl BlobEncoder + 'h) -> Self {
        self.blob_encoder = Box::new(encoder);
        self
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'h) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Target dimensions: caller-supplied, else the node's measured box
    pub fn target_size(&self, node: &VisualNode, options: &Options) -> Result<(u32, u32)> {
        let width = options
            .width
            .filter(|w| *w > 0)
            .unwrap_or_else(|| self.host.measure_width(node));
        let height = options
            .height
            .filter(|h| *h > 0)
            .unwrap_or_else(|| self.host.measure_height(node));
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions(width, height));
        }
        Ok((width, height))
    }

    /// Clone and snapshot `node`, then run both inliners and apply options.
    /// The result is what gets serialized into the container.
    pub async fn snapshot(&self, node: &VisualNode, options: &Options) -> Result<VisualNode> {
        enter(Stage::Idle);
        enter(Stage::Cloning);
        enter(Stage::Snapshotting);
        let cloner = TreeCloner::new(self.host, options.filter.as_deref());
        let clone = cloner
            .clone_node(node)
            .await
            .ok_or(Error::EmptySnapshot)?;
        debug!("captured {} nodes from <{}>", clone.node_count(), node.tag);

        enter(Stage::Inlining);
        let clone = self.fonts.inline_all(clone, options).await?;
        let mut clone = self.images.inline_all(clone, options).await?;
        apply_options(&mut clone, options);
        Ok(clone)
    }

    /// The `data:image/svg+xml` container URI for `node`
    pub async fn to_svg(&self, node: &VisualNode, options: &Options) -> Result<String> {
        let (width, height) = self.target_size(node, options)?;
        let mut clone = self.snapshot(node, options).await?;
        let uri = make_svg_data_uri(&mut clone, width, height)?;
        enter(Stage::Composited);
        Ok(uri)
    }

    /// Decode the container and draw it onto a surface of the target size
    pub async fn draw(&self, node: &VisualNode, options: &Options) -> Result<Surface> {
        let (width, height) = self.target_size(node, options)?;
        let uri = self.to_svg(node, options).await?;

        enter(Stage::Decoding);
        let image = self.decoder.decode(&uri).await?;
        if !self.settle_delay.is_zero() {
            self.sleeper.sleep(self.settle_delay).await?;
        }

        let surface = raster::draw(&image, width, height, options.bgcolor.as_deref())?;
        enter(Stage::Drawn);
        Ok(surface)
    }

    /// PNG bytes
    pub async fn to_png(&self, node: &VisualNode, options: &Options) -> Result<Vec<u8>> {
        let png = self.draw(node, options).await?.to_png()?;
        enter(Stage::Encoded);
        Ok(png)
    }

    /// JPEG bytes at [`Options::jpeg_quality`]
    pub async fn to_jpeg(&self, node: &VisualNode, options: &Options) -> Result<Vec<u8>> {
        let jpeg = self
            .draw(node, options)
            .await?
            .to_jpeg(options.jpeg_quality())?;
        enter(Stage::Encoded);
        Ok(jpeg)
    }

    /// A blob from the configured [`BlobEncoder`]
    pub async fn to_blob(&self, node: &VisualNode, options: &Options) -> Result<Blob> {
        let surface = self.draw(node, options).await?;
        let blob = self.blob_encoder.encode(&surface).await?;
        enter(Stage::Encoded);
        Ok(blob)
    }

    /// Straight-alpha RGBA bytes for the target rectangle
    pub async fn to_pixel_data(&self, node: &VisualNode, options: &Options) -> Result<Vec<u8>> {
        let (width, height) = self.target_size(node, options)?;
        let surface = self.draw(node, options).await?;
        let data = surface.pixel_data(width, height);
        enter(Stage::PixelRead);
        Ok(data)
    }
}

/// Background color, explicit size and style overrides land on the clone root
fn apply_options(clone: &mut VisualNode, options: &Options) {
    if let Some(bg) = options.bgcolor.as_deref() {
        clone.style.set_property("background-color", bg, false);
    }
    if let Some(w) = options.width.filter(|w| *w > 0) {
        clone.style.set_property("width", &format!("{}px", w), false);
    }
    if let Some(h) = options.height.filter(|h| *h > 0) {
        clone.style.set_property("height", &format!("{}px", h), false);
    }
    clone.style.merge(&options.style);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::StaticHost;
    use crate::style::StyleDeclaration;

    #[test]
    fn stage_names() {
        assert_eq!(Stage::PixelRead.to_string(), "pixel-read");
        assert_eq!(Stage::Composited.to_string(), "composited");
    }

    #[test]
    fn options_override_measured_size() {
        let node = VisualNode::element("div");
        let mut host = StaticHost::new();
        host.set_size(&node, 100, 50);
        let renderer = Renderer::new(&host);

        assert_eq!(
            renderer.target_size(&node, &Options::default()).unwrap(),
            (100, 50)
        );
        let opts = Options::default().with_size(20, 0);
        assert_eq!(renderer.target_size(&node, &opts).unwrap(), (20, 50));

        let unmeasured = VisualNode::element("div");
        assert!(matches!(
            renderer.target_size(&unmeasured, &Options::default()),
            Err(Error::InvalidDimensions(0, 0))
        ));
    }

    #[test]
    fn apply_options_sets_root_style() {
        let mut clone = VisualNode::element("div").with_style("color", "red");
        let options = Options {
            width: Some(10),
            height: None,
            bgcolor: Some("#fff".into()),
            style: StyleDeclaration::parse("color: blue; margin: 0"),
            ..Default::default()
        };
        apply_options(&mut clone, &options);
        assert_eq!(
            clone.style.css_text(),
            "color: blue; background-color: #fff; width: 10px; margin: 0;"
        );
    }

    #[derive(Default)]
    struct RecordingSleeper {
        slept: std::cell::RefCell<Vec<Duration>>,
    }

    impl Sleeper for &RecordingSleeper {
        fn sleep<'a>(&'a self, delay: Duration) -> LocalBoxFuture<'a, Result<()>> {
            self.slept.borrow_mut().push(delay);
            async { Ok(()) }.boxed_local()
        }
    }

    #[test]
    fn default_sleeper_outside_tokio_is_an_error() {
        let node = VisualNode::element("div");
        let mut host = StaticHost::new();
        host.set_size(&node, 4, 4);
        let renderer = Renderer::new(&host);
        let err = futures::executor::block_on(renderer.to_png(&node, &Options::default()))
            .unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn custom_sleeper_runs_on_any_executor() {
        let node = VisualNode::element("div");
        let mut host = StaticHost::new();
        host.set_size(&node, 4, 4);
        let sleeper = RecordingSleeper::default();
        let renderer = Renderer::new(&host)
            .with_sleeper(&sleeper)
            .with_settle_delay(Duration::from_millis(5));
        let png = futures::executor::block_on(renderer.to_png(&node, &Options::default()))
            .unwrap();
        assert_eq!(&png[1..4], b"PNG");
        assert_eq!(*sleeper.slept.borrow(), vec![Duration::from_millis(5)]);
    }

    #[tokio::test]
    async fn settle_delay_is_tunable() {
        let host = StaticHost::new();
        let renderer = Renderer::new(&host);
        assert_eq!(renderer.settle_delay(), DEFAULT_SETTLE_DELAY);
        let renderer = renderer.with_settle_delay(Duration::ZERO);
        assert!(renderer.settle_delay().is_zero());
    }
}
