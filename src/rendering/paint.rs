/// CSS color parsing for background fills

use crate::{Error, Result};
use std::str::FromStr;

/// Parse any CSS color accepted by SVG (`#f00`, `rgb(...)`, `hsl(...)`,
/// named colors, `transparent`) into a tiny-skia color.
pub fn parse_color(text: &str) -> Result<tiny_skia::Color> {
    let c = svgtypes::Color::from_str(text.trim())
        .map_err(|e| Error::ConfigError(format!("invalid color '{}': {}", text, e)))?;
    Ok(tiny_skia::Color::from_rgba8(c.red, c.green, c.blue, c.alpha))
}
