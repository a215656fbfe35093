use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use domshot::container::encode_base64_data_uri;
use domshot::html::{parse_fragment, InlineStyleHost};
use domshot::inline::{mime_for_path, FsResourceLoader, ResourceImageInliner};
use domshot::{Options, Renderer, StyleDeclaration, VisualNode};
use env_logger::{Builder, Env};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// SVG container data URI, written as text
    Svg,
    Png,
    Jpeg,
    /// Straight-alpha RGBA bytes
    Raw,
}

/// Render the first element of an HTML file to an image
#[derive(Parser, Debug)]
#[command(name = "domshot", version)]
struct Args {
    /// HTML file to render
    input: PathBuf,

    /// Output file
    #[arg(short, long)]
    output: PathBuf,

    #[arg(short, long, value_enum, default_value = "png")]
    format: Format,

    /// Output width in pixels (default: the element's measured width)
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels (default: the element's measured height)
    #[arg(long)]
    height: Option<u32>,

    /// Background color, any CSS color
    #[arg(long)]
    bgcolor: Option<String>,

    /// JPEG quality between 0 and 1
    #[arg(long)]
    quality: Option<f32>,

    /// Image used in place of images that fail to load
    #[arg(long)]
    placeholder: Option<PathBuf>,

    /// Append a timestamp to image requests
    #[arg(long)]
    cache_bust: bool,

    /// Leave out elements with this tag name (repeatable)
    #[arg(long = "exclude", value_name = "TAG")]
    exclude: Vec<String>,

    /// Extra root style as name:value (repeatable)
    #[arg(long = "style", value_name = "NAME:VALUE")]
    style: Vec<String>,

    /// Size used for elements without an explicit width/height
    #[arg(long, default_value = "800x600")]
    viewport: String,
}

fn parse_viewport(s: &str) -> Result<(u32, u32)> {
    let Some((w, h)) = s.split_once(['x', 'X']) else {
        bail!("viewport must look like WIDTHxHEIGHT, got {:?}", s);
    };
    Ok((w.trim().parse()?, h.trim().parse()?))
}

fn parse_style(entries: &[String]) -> Result<StyleDeclaration> {
    let mut style = StyleDeclaration::new();
    for entry in entries {
        let Some((name, value)) = entry.split_once(':') else {
            bail!("style override must look like name:value, got {:?}", entry);
        };
        style.set_property(name, value, false);
    }
    Ok(style)
}

fn placeholder_uri(path: &Path) -> Result<String> {
    let data = std::fs::read(path)
        .with_context(|| format!("reading placeholder {}", path.display()))?;
    Ok(encode_base64_data_uri(mime_for_path(path), &data))
}

fn build_options(args: &Args) -> Result<Options> {
    let mut options = Options {
        width: args.width,
        height: args.height,
        bgcolor: args.bgcolor.clone(),
        quality: args.quality,
        cache_bust: args.cache_bust,
        style: parse_style(&args.style)?,
        ..Default::default()
    };
    if let Some(path) = &args.placeholder {
        options.image_placeholder = Some(placeholder_uri(path)?);
    }
    if !args.exclude.is_empty() {
        let excluded: Vec<String> = args.exclude.iter().map(|t| t.to_ascii_lowercase()).collect();
        options = options.with_filter(move |n: &VisualNode| !excluded.contains(&n.tag));
    }
    Ok(options)
}

async fn run(args: Args) -> Result<()> {
    let html = std::fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let node = parse_fragment(&html)?;
    let options = build_options(&args)?;
    let (vw, vh) = parse_viewport(&args.viewport)?;

    let base = args
        .input
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let host = InlineStyleHost::new(vw, vh);
    let renderer = Renderer::new(&host)
        .with_image_inliner(ResourceImageInliner::new(FsResourceLoader::new(base)));

    let bytes = match args.format {
        Format::Svg => renderer.to_svg(&node, &options).await?.into_bytes(),
        Format::Png => renderer.to_png(&node, &options).await?,
        Format::Jpeg => renderer.to_jpeg(&node, &options).await?,
        Format::Raw => renderer.to_pixel_data(&node, &options).await?,
    };
    std::fs::write(&args.output, &bytes)
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!(
        "wrote {} bytes of {:?} to {}",
        bytes.len(),
        args.format,
        args.output.display()
    );
    Ok(())
}

fn main() -> Result<()> {
    Builder::from_env(Env::default().filter_or("RUST_LOG", "warn")).init();
    let args = Args::parse();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(args))
}
