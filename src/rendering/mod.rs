//! Raster surfaces and the encodings read back from a drawn snapshot

pub mod decode;
pub mod layout;
pub mod paint;
pub mod raster;

use crate::{Error, Result};
use base64::Engine as _;
use futures::future::{FutureExt, LocalBoxFuture};
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use tiny_skia::{Color, IntSize, Pixmap, PremultipliedColorU8};

/// An RGBA raster surface.
///
/// Pixels are stored premultiplied (tiny-skia's layout); every read-back
/// operation hands out straight-alpha bytes.
#[derive(Clone)]
pub struct Surface {
    pixmap: Pixmap,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl Surface {
    /// A transparent surface
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Pixmap::new(width, height)
            .map(|pixmap| Self { pixmap })
            .ok_or(Error::InvalidDimensions(width, height))
    }

    pub fn from_pixmap(pixmap: Pixmap) -> Self {
        Self { pixmap }
    }

    /// Build a surface from straight-alpha RGBA bytes
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self> {
        let size =
            IntSize::from_wh(width, height).ok_or(Error::InvalidDimensions(width, height))?;
        if rgba.len() != width as usize * height as usize * 4 {
            return Err(Error::Decode(format!(
                "expected {} bytes of RGBA for {}x{}, got {}",
                width as usize * height as usize * 4,
                width,
                height,
                rgba.len()
            )));
        }
        let mut data = Vec::with_capacity(rgba.len());
        for px in rgba.chunks_exact(4) {
            let c = tiny_skia::ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Pixmap::from_vec(data, size)
            .map(|pixmap| Self { pixmap })
            .ok_or(Error::InvalidDimensions(width, height))
    }

    pub fn decode_png(bytes: &[u8]) -> Result<Self> {
        Pixmap::decode_png(bytes)
            .map(|pixmap| Self { pixmap })
            .map_err(|e| Error::Decode(format!("png decode failed: {}", e)))
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    pub fn fill(&mut self, color: Color) {
        self.pixmap.fill(color);
    }

    /// Straight-alpha RGBA of one pixel
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.pixmap.pixel(x, y).map(demultiply)
    }

    /// Straight-alpha RGBA bytes for the `width`×`height` rectangle at the
    /// origin. Pixels outside the surface read as transparent black.
    pub fn pixel_data(&self, width: u32, height: u32) -> Vec<u8> {
        let mut out = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                out.extend_from_slice(&self.pixel(x, y).unwrap_or([0, 0, 0, 0]));
            }
        }
        out
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| Error::Encode(format!("png encode failed: {}", e)))
    }

    /// JPEG at `quality` in `0.0..=1.0`. Transparent pixels come out black.
    pub fn to_jpeg(&self, quality: f32) -> Result<Vec<u8>> {
        let quality = (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8;
        let mut rgb = Vec::with_capacity(self.pixmap.data().len() / 4 * 3);
        for px in self.pixmap.data().chunks_exact(4) {
            rgb.extend_from_slice(&px[..3]);
        }
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality)
            .encode(&rgb, self.width(), self.height(), ExtendedColorType::Rgb8)
            .map_err(|e| Error::Encode(format!("jpeg encode failed: {}", e)))?;
        Ok(out)
    }

    /// `data:image/png;base64,...` form of the surface
    pub fn to_data_url(&self) -> Result<String> {
        let png = self.to_png()?;
        Ok(format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png)
        ))
    }
}

fn demultiply(c: PremultipliedColorU8) -> [u8; 4] {
    let c = c.demultiply();
    [c.red(), c.green(), c.blue(), c.alpha()]
}

/// Encoded image bytes tagged with their media type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Blob {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Turns a drawn surface into a [`Blob`]
pub trait BlobEncoder {
    fn encode<'a>(&'a self, surface: &'a Surface) -> LocalBoxFuture<'a, Result<Blob>>;
}

/// Default encoder producing `image/png` blobs
#[derive(Debug, Default, Clone, Copy)]
pub struct PngBlobEncoder;

impl BlobEncoder for PngBlobEncoder {
    fn encode<'a>(&'a self, surface: &'a Surface) -> LocalBoxFuture<'a, Result<Blob>> {
        async move {
            Ok(Blob {
                mime_type: "image/png".to_string(),
                data: surface.to_png()?,
            })
        }
        .boxed_local()
    }
}
