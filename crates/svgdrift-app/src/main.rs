use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use svgdrift_core::{AnimationExecutor, Engine, ParticleSettings};
use svgdrift_platform::{
    HeadlessSurface, JsonExecutor, Result, Runner, SurfaceRect, TracingExecutor,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_SETTINGS: &str = include_str!("../assets/circles.toml");
const DEFAULT_TEMPLATE: &str = include_str!("../assets/circle.svg");

/// Spawn drifting copies of an SVG shape on a headless surface.
#[derive(Parser, Debug)]
#[command(name = "svgdrift", version)]
struct Args {
    /// TOML particle settings (defaults to red circles)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// SVG template (defaults to a circle)
    #[arg(long)]
    template: Option<PathBuf>,

    /// Milliseconds to keep spawning before stopping
    #[arg(long, default_value_t = 10_000)]
    run_for: u64,

    /// Overrides the settings seed
    #[arg(long)]
    seed: Option<u64>,

    /// Print every animation plan as a JSON line on stdout
    #[arg(long)]
    json: bool,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,
}

fn main() {
    // Init logging; stderr keeps stdout free for --json
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let args = Args::parse();
    info!("svgdrift starting");
    if let Err(e) = run_app(&args) {
        eprintln!("svgdrift error: {e}");
        std::process::exit(1);
    }
}

fn run_app(args: &Args) -> Result<()> {
    let settings_source = match &args.settings {
        Some(path) => std::fs::read_to_string(path)?,
        None => DEFAULT_SETTINGS.to_string(),
    };
    let template_source = match &args.template {
        Some(path) => std::fs::read_to_string(path)?,
        None => DEFAULT_TEMPLATE.to_string(),
    };

    let mut settings = ParticleSettings::from_toml_str(&settings_source)?;
    if args.seed.is_some() {
        settings.seed = args.seed;
    }

    let surface = HeadlessSurface::new(SurfaceRect {
        x: 0,
        y: 0,
        width: args.width,
        height: args.height,
    });
    let run_for = Duration::from_millis(args.run_for);

    if args.json {
        let executor = JsonExecutor::new(std::io::stdout());
        drive(Engine::new(surface, executor, &template_source, &settings)?, run_for)
    } else {
        let executor = TracingExecutor::new();
        drive(Engine::new(surface, executor, &template_source, &settings)?, run_for)
    }
}

fn drive<A: AnimationExecutor + 'static>(
    engine: Engine<HeadlessSurface, A>,
    run_for: Duration,
) -> Result<()> {
    engine.container().log_current_layout("startup");
    let runner = Runner::spawn(engine)?;
    runner.start()?;

    let deadline = Instant::now() + run_for;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        std::thread::sleep(remaining.min(Duration::from_secs(1)));

        let status = runner.status()?;
        info!(
            "{:?}: {} live, {} spawned, {} expired, {} skipped at capacity",
            status.elapsed,
            status.active,
            status.stats.spawned,
            status.stats.expired,
            status.stats.skipped
        );
        if status.fault.is_some() {
            break;
        }
    }

    info!("stopping; live particles finish their lifetime");
    let engine = runner.shutdown()?;
    engine.container().log_current_layout("shutdown");
    match engine.fault() {
        Some(fault) => Err(fault.to_string().into()),
        None => Ok(()),
    }
}
