use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use depthview::prep::{fit_pair, DEFAULT_MAX_WIDTH};
use depthview::{
    BuildOptions, ColorImage, DepthMap, EmbedOptions, ViewerBuilder, ViewerDocument,
};
use log::info;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::Instant,
};

/// What to emit for the built viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// The HTML document itself.
    Html,
    /// `data:text/html;base64,...`
    DataUri,
    /// An `<iframe>` snippet wrapping the data URI.
    Iframe,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutputFormat::Html => "html",
            OutputFormat::DataUri => "data-uri",
            OutputFormat::Iframe => "iframe",
        };

        f.write_str(s)
    }
}

/// Builds a self-contained depth-parallax viewer from a photo and its depth map.
#[derive(Parser, Debug, Clone)]
#[command(name = "depth2view", version)]
struct Args {
    /// Color photograph (JPEG or PNG).
    #[arg(long)]
    image: PathBuf,

    /// Depth map aligned with the photograph; read as 8-bit grayscale.
    #[arg(long)]
    depth: PathBuf,

    /// Output file. Writes to stdout when omitted.
    #[arg(long, short)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Html)]
    format: OutputFormat,

    /// JPEG quality of the embedded color asset (1-100).
    #[arg(long, env = "DEPTHVIEW_JPEG_QUALITY", default_value_t = depthview::asset::DEFAULT_JPEG_QUALITY)]
    jpeg_quality: u8,

    /// Downscale images wider than this many pixels; 0 keeps the original size.
    #[arg(long, default_value_t = DEFAULT_MAX_WIDTH)]
    max_width: u32,

    /// Skip the color/depth dimension check.
    #[arg(long, default_value_t = false)]
    no_validate: bool,

    /// Resample the depth map to the (possibly downscaled) photo size.
    #[arg(long, default_value_t = false)]
    resample_depth: bool,

    /// Height of the iframe in CSS pixels, for `--format iframe`.
    #[arg(long, default_value_t = 600)]
    iframe_height: u32,
}

fn load_color(path: &Path) -> Result<ColorImage> {
    let img = image::open(path).with_context(|| format!("open image {}", path.display()))?;
    Ok(ColorImage::from(&img))
}

fn load_depth(path: &Path) -> Result<DepthMap> {
    let img = image::open(path).with_context(|| format!("open depth map {}", path.display()))?;
    Ok(DepthMap::from(&img))
}

/// Applies the width cap and pairs the photo with its depth.
fn prepare(color: ColorImage, depth: DepthMap, args: &Args) -> Result<(ColorImage, DepthMap)> {
    fit_pair(&color, depth, args.max_width, args.resample_depth)
}

fn render(doc: &ViewerDocument, args: &Args) -> String {
    match args.format {
        OutputFormat::Html => doc.html().to_string(),
        OutputFormat::DataUri => doc.to_data_uri(),
        OutputFormat::Iframe => doc.to_iframe(&EmbedOptions {
            height_px: args.iframe_height,
            ..EmbedOptions::default()
        }),
    }
}

fn run(args: &Args) -> Result<String> {
    let start = Instant::now();

    let color = load_color(&args.image)?;
    let depth = load_depth(&args.depth)?;
    let (color, depth) = prepare(color, depth, args)?;

    let builder = ViewerBuilder::new(BuildOptions {
        jpeg_quality: args.jpeg_quality,
        validate_dimensions: !args.no_validate,
    });
    let doc = builder
        .build(&color, &depth)
        .context("failed to build viewer document")?;

    let out = render(&doc, args);
    info!(
        "Built {} viewer for {} image in {:.2?} ({} bytes)",
        args.format,
        color.dimensions(),
        start.elapsed(),
        out.len()
    );

    Ok(out)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let out = run(&args)?;

    match &args.output {
        Some(path) => {
            fs::write(path, &out).with_context(|| format!("write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(out.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}
