//! Content inliners
//!
//! Fonts and images referenced by a clone must be embedded before the
//! container is decoded, since the decoder will not fetch anything. Both
//! passes are collaborators behind [`FontInliner`] and [`ImageInliner`]; they
//! take ownership of the clone and return a tree of the same shape.

use crate::container::encode_base64_data_uri;
use crate::dom::VisualNode;
use crate::{Error, Options, Result};
use futures::future::{FutureExt, LocalBoxFuture};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Embeds web fonts used by the clone
pub trait FontInliner {
    fn inline_all<'a>(
        &'a self,
        tree: VisualNode,
        options: &'a Options,
    ) -> LocalBoxFuture<'a, Result<VisualNode>>;
}

/// Embeds images (`<img>` sources, CSS backgrounds) used by the clone
pub trait ImageInliner {
    fn inline_all<'a>(
        &'a self,
        tree: VisualNode,
        options: &'a Options,
    ) -> LocalBoxFuture<'a, Result<VisualNode>>;
}

/// Leaves the tree untouched
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFontInliner;

/// Leaves the tree untouched
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopImageInliner;

impl FontInliner for NoopFontInliner {
    fn inline_all<'a>(
        &'a self,
        tree: VisualNode,
        _options: &'a Options,
    ) -> LocalBoxFuture<'a, Result<VisualNode>> {
        async move { Ok(tree) }.boxed_local()
    }
}

impl ImageInliner for NoopImageInliner {
    fn inline_all<'a>(
        &'a self,
        tree: VisualNode,
        _options: &'a Options,
    ) -> LocalBoxFuture<'a, Result<VisualNode>> {
        async move { Ok(tree) }.boxed_local()
    }
}

/// Bytes of a fetched resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Fetches the bytes behind a URL
pub trait ResourceLoader {
    fn load<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<Resource>>;
}

/// Loads references as paths relative to a base directory
#[derive(Debug, Clone)]
pub struct FsResourceLoader {
    base: PathBuf,
}

impl FsResourceLoader {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl ResourceLoader for FsResourceLoader {
    fn load<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<Resource>> {
        async move {
            let path = url
                .strip_prefix("file://")
                .unwrap_or(url)
                .split(['?', '#'])
                .next()
                .unwrap_or_default();
            let path = self.base.join(path);
            let data = tokio::fs::read(&path).await?;
            Ok(Resource {
                mime_type: mime_for_path(&path).to_string(),
                data,
            })
        }
        .boxed_local()
    }
}

/// Media type guessed from a file extension
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Style properties whose `url(...)` references get inlined
const BACKGROUND_PROPERTIES: &[&str] = &["background", "background-image"];

/// Rewrites image references into `data:` URIs through a [`ResourceLoader`].
///
/// Failed loads are replaced by [`Options::image_placeholder`] when set and
/// fail the call otherwise.
pub struct ResourceImageInliner<L> {
    loader: L,
}

impl<L: ResourceLoader> ResourceImageInliner<L> {
    pub fn new(loader: L) -> Self {
        Self { loader }
    }

    fn inline_node<'a>(
        &'a self,
        node: &'a mut VisualNode,
        options: &'a Options,
    ) -> LocalBoxFuture<'a, Result<()>> {
        async move {
            if node.is_element() {
                if node.tag == "img" {
                    if let Some(src) = node.attribute("src").map(str::to_string) {
                        if !is_inlined(&src) {
                            let data = self.resolve(&src, options).await?;
                            node.set_attribute("src", &data);
                        }
                    }
                }
                for name in BACKGROUND_PROPERTIES {
                    let Some(value) = node.style.get_property_value(name).map(str::to_string)
                    else {
                        continue;
                    };
                    let important = node.style.get_property_priority(name);
                    let rewritten = self.inline_urls(&value, options).await?;
                    if rewritten != value {
                        node.style.set_property(name, &rewritten, important);
                    }
                }
            }
            for child in node.children.iter_mut() {
                self.inline_node(child, options).await?;
            }
            Ok(())
        }
        .boxed_local()
    }

    async fn inline_urls(&self, value: &str, options: &Options) -> Result<String> {
        let mut out = String::with_capacity(value.len());
        let mut last = 0;
        for (start, end, url) in url_references(value) {
            out.push_str(&value[last..start]);
            if is_inlined(&url) {
                out.push_str(&value[start..end]);
            } else {
                let data = self.resolve(&url, options).await?;
                out.push_str(&format!("url(\"{}\")", data));
            }
            last = end;
        }
        out.push_str(&value[last..]);
        Ok(out)
    }

    async fn resolve(&self, url: &str, options: &Options) -> Result<String> {
        let request = if options.cache_bust {
            cache_bust(url)
        } else {
            url.to_string()
        };
        debug!("inlining image {}", request);
        match self.loader.load(&request).await {
            Ok(resource) => Ok(encode_base64_data_uri(&resource.mime_type, &resource.data)),
            Err(e) => match &options.image_placeholder {
                Some(placeholder) => {
                    warn!("using placeholder for {}: {}", url, e);
                    Ok(placeholder.clone())
                }
                None => Err(Error::ImageLoad(format!("{}: {}", url, e))),
            },
        }
    }
}

impl<L: ResourceLoader> ImageInliner for ResourceImageInliner<L> {
    fn inline_all<'a>(
        &'a self,
        tree: VisualNode,
        options: &'a Options,
    ) -> LocalBoxFuture<'a, Result<VisualNode>> {
        async move {
            let mut tree = tree;
            self.inline_node(&mut tree, options).await?;
            Ok(tree)
        }
        .boxed_local()
    }
}

fn is_inlined(url: &str) -> bool {
    url.trim_start().to_ascii_lowercase().starts_with("data:")
}

/// Append a timestamp query parameter so caches are bypassed
fn cache_bust(url: &str) -> String {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, sep, stamp)
}

/// `(start, end, url)` for every `url(...)` in a CSS value; the range covers
/// the whole function token
fn url_references(value: &str) -> Vec<(usize, usize, String)> {
    let lower = value.to_ascii_lowercase();
    let mut out = Vec::new();
    let mut from = 0;
    while let Some(pos) = lower[from..].find("url(") {
        let start = from + pos;
        let inner_start = start + 4;
        let Some(close) = value[inner_start..].find(')') else {
            break;
        };
        let end = inner_start + close + 1;
        let inner = value[inner_start..end - 1]
            .trim()
            .trim_matches(|c| c == '"' || c == '\'');
        if !inner.is_empty() {
            out.push((start, end, inner.to_string()));
        }
        from = end;
    }
    out
}
