use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

use chartreel::{
    AnimationDirective, ChartKind, ChartStyle, Dataset, Element, EncoderSession, ExportProgress,
    ExportRequest, FrameCapture as _, FrameDescriptor, FrameIndex, ReelConfig, Stage,
    SvgRasterizer, Theme, VideoExporter,
};

#[derive(Parser, Debug)]
#[command(name = "chartreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a dataset as an SVG chart.
    Chart(ChartArgs),
    /// Render a single animated frame as a PNG.
    Frame(FrameArgs),
    /// Export an animated MP4 (requires an encoder, `ffmpeg` by default).
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// File holding a two-column table or free-form labeled values.
    #[arg(long = "in", conflicts_with_all = ["text", "svg"])]
    in_path: Option<PathBuf>,

    /// Inline labeled values, e.g. "Apples 40%, pears 60%".
    #[arg(long, conflicts_with = "svg")]
    text: Option<String>,

    /// Animate an existing SVG instead of a generated chart.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Chart kind; chosen from the data when omitted.
    #[arg(long)]
    kind: Option<ChartKind>,

    /// Theme hint, e.g. "dark".
    #[arg(long, default_value = "")]
    theme: String,
}

#[derive(Args, Debug)]
struct ChartArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[arg(long, default_value_t = 960)]
    width: u32,

    #[arg(long, default_value_t = 540)]
    height: u32,

    /// Output SVG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Animation progress in [0, 1].
    #[arg(long, default_value_t = 0.5)]
    progress: f64,

    /// Animation as `kind[:duration[:delay[:ease]]]`; repeatable.
    #[arg(long = "anim", value_parser = parse_anim)]
    animations: Vec<AnimationDirective>,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// JSON config file; flags below override its `request` section.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    duration: Option<f64>,

    #[arg(long)]
    fps: Option<u32>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Constant rate factor (0-51, lower is better).
    #[arg(long)]
    quality: Option<u32>,

    /// Animation as `kind[:duration[:delay[:ease]]]`; repeatable.
    #[arg(long = "anim", value_parser = parse_anim)]
    animations: Vec<AnimationDirective>,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,
}

fn parse_anim(s: &str) -> Result<AnimationDirective, String> {
    AnimationDirective::parse_compact(s).map_err(|e| e.to_string())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Chart(args) => cmd_chart(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Export(args) => cmd_export(args),
    }
}

fn read_dataset(source: &SourceArgs) -> anyhow::Result<Dataset> {
    let text = match (&source.in_path, &source.text) {
        (Some(path), _) => std::fs::read_to_string(path)
            .with_context(|| format!("read data '{}'", path.display()))?,
        (None, Some(text)) => text.clone(),
        (None, None) => anyhow::bail!("one of --in, --text or --svg is required"),
    };
    Ok(Dataset::parse(&text)?)
}

fn chart_style(source: &SourceArgs, dataset: &Dataset, width: u32, height: u32) -> ChartStyle {
    let mut style = ChartStyle::for_dataset(dataset, Theme::from_hint(&source.theme));
    if let Some(kind) = source.kind {
        style.kind = kind;
    }
    style.width = width;
    style.height = height;
    style
}

fn load_element(source: &SourceArgs, width: u32, height: u32) -> anyhow::Result<Element> {
    if let Some(svg) = &source.svg {
        return Ok(Element::from_path(svg)?);
    }
    let dataset = read_dataset(source)?;
    let style = chart_style(source, &dataset, width, height);
    tracing::info!(entries = dataset.len(), kind = ?style.kind, theme = ?style.theme, "charting dataset");
    Ok(chartreel::data::chart::render_element(&dataset, &style)?)
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn cmd_chart(args: ChartArgs) -> anyhow::Result<()> {
    let dataset = read_dataset(&args.source)?;
    let style = chart_style(&args.source, &dataset, args.width, args.height);
    let svg = chartreel::data::chart::render_svg(&dataset, &style)?;

    ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, svg)
        .with_context(|| format!("write svg '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    if !(0.0..=1.0).contains(&args.progress) {
        anyhow::bail!("--progress must be within [0, 1]");
    }
    let element = load_element(&args.source, args.width, args.height)?;
    let animations: Arc<[AnimationDirective]> = if args.animations.is_empty() {
        ExportRequest::default().resolve()?.animations.into()
    } else {
        args.animations.into()
    };

    let stage = Stage::new();
    let canvas = chartreel::Canvas {
        width: args.width,
        height: args.height,
    };
    let guard = stage.mount_offscreen(&element, canvas)?;
    let descriptor = FrameDescriptor {
        index: FrameIndex(0),
        normalized_time: args.progress,
        source: Arc::clone(guard.staged()),
        canvas,
        animations,
    };

    let rasterizer = SvgRasterizer::new();
    let frame = rasterizer.capture_frame(&descriptor)?;
    rasterizer.release();

    ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, &frame.png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => ReelConfig::from_path(path)?,
        None => ReelConfig::default(),
    };

    let request = ExportRequest {
        duration_seconds: args.duration,
        frames_per_second: args.fps,
        width: args.width,
        height: args.height,
        quality: args.quality,
        animations: (!args.animations.is_empty()).then_some(args.animations),
    }
    .or(&config.request);
    let resolved = request.resolve()?;
    let element = load_element(
        &args.source,
        resolved.canvas.width,
        resolved.canvas.height,
    )?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;

    let result = runtime.block_on(async {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let reporter = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    ExportProgress::Capturing { done, total } => {
                        tracing::info!(done, total, "capturing");
                    }
                    ExportProgress::Failed { kind, message } => {
                        tracing::warn!(kind, %message, "export failed");
                    }
                    other => tracing::info!(event = ?other, "progress"),
                }
            }
        });

        let exporter = VideoExporter::new(EncoderSession::from_config(config.encoder), Stage::new())
            .with_batch_size(config.pipeline.batch_size)
            .with_progress(tx);
        let result = exporter.export(&element, request).await;
        drop(exporter);
        let _ = reporter.await;
        result
    })?;

    ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, &result.bytes)
        .with_context(|| format!("write mp4 '{}'", args.out.display()))?;
    eprintln!(
        "wrote {} ({} frames, {} bytes)",
        args.out.display(),
        result.frame_count,
        result.bytes.len()
    );
    Ok(())
}
