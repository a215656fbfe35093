/// Draws a decoded container image onto the output surface

use crate::rendering::paint::parse_color;
use crate::rendering::Surface;
use crate::Result;
use tiny_skia::{PixmapPaint, Transform};

/// Allocate a `width`×`height` surface, fill it with `background` when set,
/// then draw `image` at the origin, unscaled.
pub fn draw(image: &Surface, width: u32, height: u32, background: Option<&str>) -> Result<Surface> {
    let mut surface = Surface::new(width, height)?;
    if let Some(bg) = background {
        surface.fill(parse_color(bg)?);
    }
    surface.pixmap_mut().draw_pixmap(
        0,
        0,
        image.pixmap().as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
    Ok(surface)
}
