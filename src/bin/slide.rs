use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "slide", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a JSON-described surface to a PNG snapshot.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input surface JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Optional engine configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Give up waiting for resources and rendering after this many seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
    }
}

fn read_config(path: Option<&Path>) -> anyhow::Result<slide::SlideConfig> {
    match path {
        Some(p) => slide::SlideConfig::from_json_file(p)
            .with_context(|| format!("load config '{}'", p.display())),
        None => Ok(slide::SlideConfig::default()),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let cfg = read_config(args.config.as_deref())?;
    let doc = slide::SurfaceDoc::from_json_file(&args.in_path)
        .with_context(|| format!("load surface '{}'", args.in_path.display()))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("slide-io")
        .build()
        .context("start async runtime")?;

    let backend = slide::DefaultResourceBackend::new(&cfg.resources)?;
    let mut scheduler = slide::RenderScheduler::new(
        &cfg.scheduler,
        Arc::new(slide::CompositingRasterizer),
        Arc::new(backend),
        runtime.handle().clone(),
    )?;

    let request = slide::RenderRequest::for_item(doc.id.as_str(), "document", &doc.variant)
        .with_resources(doc.resources());
    let key = request.key.clone();
    let surface = scheduler.insert_surface(slide::DocSurface::new(doc));
    scheduler.render(surface, request);

    let timeout = Duration::from_secs(args.timeout_secs);
    if !scheduler.settle(Instant::now(), timeout) {
        anyhow::bail!("render did not finish within {}s", args.timeout_secs);
    }

    let stats = scheduler.stats();
    tracing::info!(
        renders = stats.renders_applied,
        resolved = stats.resources_resolved,
        missed = stats.resources_missed,
        complete = scheduler.is_fully_rendered(&key),
        "render settled"
    );

    let snapshot = scheduler
        .cache()
        .peek(&key)
        .context("rasterization produced no snapshot")?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    snapshot
        .as_image()
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
