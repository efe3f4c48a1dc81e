use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use flipbook_core::{
    mount, ContainerSize, HeadlessHost, Slot, SlotSurface, Viewer, ViewerConfig,
    DEFAULT_BREAKPOINT,
};
use flipbook_engine::{default_engine, LopdfEngine, OpenSource, PdfEngine};
use flipbook_scheduler::{runtime, RuntimeOptions};
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `flipbook_core=debug`.
pub const LOG_ENV: &str = "FLIPBOOK_LOG";

#[derive(Debug, Parser)]
#[command(name = "flipbook-cli")]
#[command(about = "Flipbook viewer CLI")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print machine-readable PDF metadata.
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Mount a headless viewer, navigate and dump the resulting spread.
    Spread(SpreadArgs),
    /// Print CLI version.
    Version,
}

#[derive(Debug, clap::Args)]
struct SpreadArgs {
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// Container width in CSS pixels
    #[arg(long, default_value_t = 1000.0)]
    width: f32,
    /// Container height in CSS pixels
    #[arg(long, default_value_t = 700.0)]
    height: f32,
    /// Window width compared against the breakpoint; defaults to --width
    #[arg(long)]
    viewport: Option<f32>,
    #[arg(long, default_value_t = 1.0)]
    dpr: f32,
    /// Pin single (true) or double (false) page mode
    #[arg(long)]
    single: Option<bool>,
    #[arg(long, default_value_t = DEFAULT_BREAKPOINT)]
    breakpoint: f32,
    #[arg(long, default_value_t = 1.0)]
    zoom: f32,
    /// Jump to this page before applying steps
    #[arg(long)]
    page: Option<u32>,
    #[arg(long, value_enum, value_delimiter = ',')]
    steps: Vec<Step>,
    /// Write left.png/right.png here
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Step {
    Next,
    Prev,
    First,
    Last,
    Toggle,
    Fullscreen,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    page_count: u32,
    first_page_size_pt: Option<PageSizeOutput>,
}

#[derive(Debug, Serialize)]
struct PageSizeOutput {
    width: f32,
    height: f32,
}

#[derive(Debug, Serialize)]
struct SpreadOutput {
    path: String,
    page_count: u32,
    current_page: u32,
    single: bool,
    cover: bool,
    can_prev: bool,
    can_next: bool,
    fullscreen: bool,
    left: Option<SlotOutput>,
    right: Option<SlotOutput>,
    cache: CacheOutput,
}

#[derive(Debug, Serialize)]
struct SlotOutput {
    page: u32,
    width_px: u32,
    height_px: u32,
    file: Option<String>,
}

#[derive(Debug, Serialize)]
struct CacheOutput {
    entries: usize,
    hits: u64,
    misses: u64,
    memory_used: usize,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_tracing();

    match cli.command {
        Commands::Info { file } => run_info(&file),
        Commands::Spread(args) => run_spread(&args),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second init in the same process keeps the first subscriber.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn run_info(file: &Path) -> Result<()> {
    ensure_pdf_exists(file)?;

    let mut engine = default_engine();
    let handle = engine.open(OpenSource::from(file)).context("failed to open PDF")?;

    let page_count = engine.page_count(handle)?;
    let first_page_size_pt = if page_count > 0 {
        let size = engine.page_size(handle, 0)?;
        Some(PageSizeOutput { width: size.width_pt, height: size.height_pt })
    } else {
        None
    };

    let payload = InfoOutput { path: file.display().to_string(), page_count, first_page_size_pt };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    engine.close(handle)?;

    Ok(())
}

fn run_spread(args: &SpreadArgs) -> Result<()> {
    ensure_pdf_exists(&args.file)?;

    runtime::init(RuntimeOptions::default()).context("failed to start render threads")?;
    let result = render_spread(args);
    runtime::shutdown();

    let payload = result?;
    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    Ok(())
}

fn render_spread(args: &SpreadArgs) -> Result<SpreadOutput> {
    let mut config = ViewerConfig::new(flipbook_core::host::DEFAULT_SELECTOR)
        .with_breakpoint(args.breakpoint)
        .with_zoom(args.zoom);
    config.single = args.single;

    let container = ContainerSize::new(args.width, args.height);
    let host = HeadlessHost::new(args.viewport.unwrap_or(args.width), container)
        .with_device_pixel_ratio(args.dpr);

    let mut viewer = mount(config, host, default_engine()).context("invalid viewer options")?;
    let page_count =
        viewer.load(OpenSource::from(args.file.as_path())).context("failed to open PDF")?;

    if let Some(page) = args.page {
        viewer.go_to(page);
    }
    for step in &args.steps {
        apply_step(&mut viewer, *step);
    }

    let (left, right) = match &args.out_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            (
                write_slot(viewer.slot(Slot::Left), Some(&dir.join("left.png")))?,
                write_slot(viewer.slot(Slot::Right), Some(&dir.join("right.png")))?,
            )
        }
        None => (write_slot(viewer.slot(Slot::Left), None)?, write_slot(viewer.slot(Slot::Right), None)?),
    };

    let flags = viewer.flags();
    let stats = viewer.cache_stats();

    Ok(SpreadOutput {
        path: args.file.display().to_string(),
        page_count,
        current_page: viewer.current_page().unwrap_or(1),
        single: flags.single,
        cover: flags.cover,
        can_prev: flags.can_prev,
        can_next: flags.can_next,
        fullscreen: viewer.is_fullscreen(),
        left,
        right,
        cache: CacheOutput {
            entries: stats.entry_count,
            hits: stats.hits,
            misses: stats.misses,
            memory_used: stats.memory_used,
        },
    })
}

fn apply_step(viewer: &mut Viewer<HeadlessHost, LopdfEngine>, step: Step) {
    let moved = match step {
        Step::Next => viewer.next().is_some(),
        Step::Prev => viewer.prev().is_some(),
        Step::First => viewer.first().is_some(),
        Step::Last => viewer.last().is_some(),
        Step::Toggle => {
            viewer.toggle_single();
            true
        }
        Step::Fullscreen => {
            viewer.toggle_fullscreen();
            true
        }
    };
    tracing::debug!(?step, moved, page = ?viewer.current_page(), "applied step");
}

fn write_slot(slot: &SlotSurface, output: Option<&Path>) -> Result<Option<SlotOutput>> {
    let Some(page) = slot.page() else {
        return Ok(None);
    };

    let surface = slot.surface();
    let file = match output {
        Some(path) if !surface.is_empty() => {
            surface
                .pixels()
                .save(path)
                .with_context(|| format!("failed to write image to {}", path.display()))?;
            Some(path.display().to_string())
        }
        _ => None,
    };

    Ok(Some(SlotOutput { page, width_px: surface.width(), height_px: surface.height(), file }))
}

fn ensure_pdf_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}
