//! Container compositing: wraps a snapshot clone into an SVG document with a
//! `foreignObject` payload and packs it into a single data URI.
//!
//! The data URI produced here is the only artifact that crosses from the
//! compositor to the rasterizer, so [`parse_data_uri`] is its exact inverse.

use crate::dom::{VisualNode, XHTML_NS};
use crate::serialize::serialize;
use crate::{Error, Result};
use base64::Engine as _;

pub const SVG_DATA_URI_PREFIX: &str = "data:image/svg+xml;charset=utf-8,";

/// An SVG wrapper holding one serialized clone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerDocument {
    width: u32,
    height: u32,
    payload: String,
}

impl ContainerDocument {
    /// Declare the XHTML namespace on `clone` and serialize it as the payload
    pub fn new(clone: &mut VisualNode, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions(width, height));
        }
        clone.set_attribute("xmlns", XHTML_NS);
        Ok(Self {
            width,
            height,
            payload: serialize(clone)?,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Serialized clone markup
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn to_svg(&self) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}"><foreignObject x="0" y="0" width="100%" height="100%">{}</foreignObject></svg>"#,
            self.width, self.height, self.payload
        )
    }

    pub fn to_data_uri(&self) -> String {
        format!("{}{}", SVG_DATA_URI_PREFIX, escape_xhtml(&self.to_svg()))
    }
}

/// Compose `clone` into a `width`×`height` container and return its data URI
pub fn make_svg_data_uri(clone: &mut VisualNode, width: u32, height: u32) -> Result<String> {
    Ok(ContainerDocument::new(clone, width, height)?.to_data_uri())
}

/// Escape markup for a non-base64 data URI: `%`, `#` and newlines would
/// otherwise be read as escapes, a fragment, or a line break.
pub fn escape_xhtml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '%' => out.push_str("%25"),
            '#' => out.push_str("%23"),
            '\n' => out.push_str("%0A"),
            c => out.push(c),
        }
    }
    out
}

/// `data:<mime>;base64,<bytes>`
pub fn encode_base64_data_uri(mime_type: &str, data: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        base64::engine::general_purpose::STANDARD.encode(data)
    )
}

/// A parsed `data:` URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: String,
    pub data: Vec<u8>,
}

pub fn parse_data_uri(uri: &str) -> Result<DataUri> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| Error::Decode(format!("not a data URI: {}", truncate(uri))))?;
    let (meta, body) = rest
        .split_once(',')
        .ok_or_else(|| Error::Decode("data URI has no payload separator".into()))?;

    let mut params = meta.split(';');
    let mime_type = match params.next().map(str::trim) {
        Some(m) if !m.is_empty() => m.to_ascii_lowercase(),
        _ => "text/plain".to_string(),
    };
    let is_base64 = params.any(|p| p.trim().eq_ignore_ascii_case("base64"));

    let data = if is_base64 {
        let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| Error::Decode(format!("invalid base64 payload: {}", e)))?
    } else {
        percent_decode(body)
    };
    Ok(DataUri { mime_type, data })
}

/// Decode `%XX` escapes; a `%` not followed by two hex digits is kept as is
pub fn percent_decode(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(h), Some(l)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                out.push(h << 4 | l);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn truncate(s: &str) -> &str {
    match s.char_indices().nth(48) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_wraps_payload_in_foreign_object() {
        let mut clone = VisualNode::element("div").with_child(VisualNode::text("hi"));
        let doc = ContainerDocument::new(&mut clone, 100, 50).unwrap();
        assert_eq!(
            doc.payload(),
            r#"<div xmlns="http://www.w3.org/1999/xhtml">hi</div>"#
        );
        let svg = doc.to_svg();
        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50">"#));
        assert!(svg.contains(r#"<foreignObject x="0" y="0" width="100%" height="100%"><div"#));
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let mut clone = VisualNode::element("div");
        assert!(matches!(
            ContainerDocument::new(&mut clone, 0, 5),
            Err(Error::InvalidDimensions(0, 5))
        ));
    }

    #[test]
    fn data_uri_round_trips_markup() {
        let mut clone = VisualNode::element("p")
            .with_style("color", "#123456")
            .with_style("width", "50%")
            .with_child(VisualNode::text("line one\nline two"));
        let doc = ContainerDocument::new(&mut clone, 10, 10).unwrap();
        let uri = doc.to_data_uri();
        assert!(uri.starts_with(SVG_DATA_URI_PREFIX));
        assert!(!uri.contains('#'));
        assert!(!uri.contains('\n'));

        let parsed = parse_data_uri(&uri).unwrap();
        assert_eq!(parsed.mime_type, "image/svg+xml");
        assert_eq!(String::from_utf8(parsed.data).unwrap(), doc.to_svg());
    }

    #[test]
    fn base64_data_uris_decode() {
        let uri = encode_base64_data_uri("image/png", b"\x89PNG");
        let parsed = parse_data_uri(&uri).unwrap();
        assert_eq!(parsed.mime_type, "image/png");
        assert_eq!(parsed.data, b"\x89PNG");
    }

    #[test]
    fn lenient_percent_decoding() {
        assert_eq!(percent_decode("100%"), b"100%");
        assert_eq!(percent_decode("a%2"), b"a%2");
        assert_eq!(percent_decode("%3Cb%3e"), b"<b>");
    }

    #[test]
    fn rejects_non_data_uris() {
        assert!(matches!(parse_data_uri("http://x/y.png"), Err(Error::Decode(_))));
        assert!(matches!(parse_data_uri("data:image/png"), Err(Error::Decode(_))));
    }
}
