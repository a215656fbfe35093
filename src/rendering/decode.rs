/// Image decoding: turns the container data URI (or an embedded raster data
/// URI) back into a surface

use crate::container::parse_data_uri;
use crate::rendering::Surface;
use crate::{Error, Result};
use futures::future::{FutureExt, LocalBoxFuture};
use log::debug;
use resvg::usvg;

/// The image-decoding primitive the rasterizer loads the container URI with
pub trait ImageDecoder {
    fn decode<'a>(&'a self, uri: &'a str) -> LocalBoxFuture<'a, Result<Surface>>;
}

/// Decodes SVG data URIs with resvg, and PNG/JPEG data URIs with
/// tiny-skia and `image`.
///
/// resvg renders SVG content only: XHTML inside a `foreignObject` is not laid
/// out, so the decoded container is transparent where the payload would be.
#[derive(Debug, Default, Clone, Copy)]
pub struct SvgImageDecoder;

impl SvgImageDecoder {
    pub fn decode_now(&self, uri: &str) -> Result<Surface> {
        let parsed = parse_data_uri(uri)?;
        debug!(
            "decoding {} ({} bytes)",
            parsed.mime_type,
            parsed.data.len()
        );
        match parsed.mime_type.as_str() {
            "image/svg+xml" => render_svg(&parsed.data),
            "image/png" => Surface::decode_png(&parsed.data),
            _ => decode_raster(&parsed.data),
        }
    }
}

impl ImageDecoder for SvgImageDecoder {
    fn decode<'a>(&'a self, uri: &'a str) -> LocalBoxFuture<'a, Result<Surface>> {
        async move { self.decode_now(uri) }.boxed_local()
    }
}

fn render_svg(data: &[u8]) -> Result<Surface> {
    let text = std::str::from_utf8(data)
        .map_err(|e| Error::Decode(format!("svg payload is not UTF-8: {}", e)))?;
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_str(text, &options)
        .map_err(|e| Error::Decode(format!("failed to parse SVG: {}", e)))?;

    let size = tree.size();
    let width = size.width().ceil() as u32;
    let height = size.height().ceil() as u32;
    let mut surface = Surface::new(width, height)?;
    resvg::render(
        &tree,
        tiny_skia::Transform::default(),
        &mut surface.pixmap_mut().as_mut(),
    );
    Ok(surface)
}

fn decode_raster(data: &[u8]) -> Result<Surface> {
    let img = image::load_from_memory(data)
        .map_err(|e| Error::Decode(format!("unsupported image data: {}", e)))?
        .to_rgba8();
    Surface::from_rgba(img.width(), img.height(), img.as_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{encode_base64_data_uri, escape_xhtml, SVG_DATA_URI_PREFIX};

    #[test]
    fn decodes_svg_at_declared_size() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10"><rect width="20" height="10" fill="#00ff00"/></svg>"##;
        let uri = format!("{}{}", SVG_DATA_URI_PREFIX, escape_xhtml(svg));
        let surface = SvgImageDecoder.decode_now(&uri).unwrap();
        assert_eq!((surface.width(), surface.height()), (20, 10));
        assert_eq!(surface.pixel(5, 5), Some([0, 255, 0, 255]));
    }

    #[test]
    fn decodes_png_data_uri() {
        let src = Surface::from_rgba(1, 1, &[1, 2, 3, 255]).unwrap();
        let uri = encode_base64_data_uri("image/png", &src.to_png().unwrap());
        let surface = SvgImageDecoder.decode_now(&uri).unwrap();
        assert_eq!(surface.pixel(0, 0), Some([1, 2, 3, 255]));
    }

    #[test]
    fn malformed_svg_is_a_decode_error() {
        let uri = format!("{}{}", SVG_DATA_URI_PREFIX, "<svg");
        assert!(matches!(
            SvgImageDecoder.decode_now(&uri),
            Err(Error::Decode(_))
        ));
    }

    #[tokio::test]
    async fn async_decode_matches_sync() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="3" height="4"></svg>"#;
        let uri = format!("{}{}", SVG_DATA_URI_PREFIX, escape_xhtml(svg));
        let surface = SvgImageDecoder.decode(&uri).await.unwrap();
        assert_eq!((surface.width(), surface.height()), (3, 4));
    }
}
