use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tagdegree::window_graph::{BackendKind, SearchKind};
use tagdegree::{build_tracker, pipeline, Config};

#[derive(Parser)]
#[command(name = "tagdegree")]
#[command(about = "Rolling average degree of a hashtag co-occurrence graph")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Window length in seconds (overrides config)
    #[arg(long, global = true)]
    window: Option<u32>,

    /// Edge backend: ordered or rescan (overrides config)
    #[arg(long, global = true)]
    backend: Option<BackendKind>,

    /// Insertion search for the ordered backend: backward or binary
    #[arg(long, global = true)]
    search: Option<SearchKind>,

    /// Log level written to stderr (overrides config)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the average degree after every record
    Run {
        /// Input file with one JSON tweet per line, or `-` for stdin
        input: PathBuf,
        /// Output file (defaults to stdout)
        output: Option<PathBuf>,
    },
    /// Check the ordered store against the rescan backend on an input
    Verify {
        /// Input file with one JSON tweet per line, or `-` for stdin
        input: PathBuf,
    },
    /// Validate configuration and print the effective settings
    CheckConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    apply_overrides(&mut config, &cli);

    init_logging(&config.logging.level)?;

    config
        .validate()
        .with_context(|| "Configuration validation failed")?;

    match cli.command {
        Commands::Run { input, output } => run_stream(&config, &input, output.as_deref()),
        Commands::Verify { input } => verify_stream(&config, &input),
        Commands::CheckConfig => {
            println!("✓ Configuration is valid");
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(window) = cli.window {
        config.window_secs = window;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(search) = cli.search {
        config.search = search;
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
}

fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    if path == Path::new("-") {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

fn run_stream(config: &Config, input: &Path, output: Option<&Path>) -> Result<()> {
    tracing::info!(
        window = config.window_secs,
        backend = %config.backend,
        search = %config.search,
        "processing {}",
        input.display()
    );

    let mut tracker = build_tracker(config.window_secs, config.backend, config.search)?;
    let reader = open_input(input)?;
    let writer = open_output(output)?;

    let summary = pipeline::run(reader, writer, &mut tracker)?;

    tracing::info!(
        lines = summary.lines,
        parsed = summary.parsed,
        skipped = summary.skipped,
        rejected = summary.rejected,
        edges = summary.edges,
        vertices = summary.vertices,
        "done"
    );
    Ok(())
}

fn verify_stream(config: &Config, input: &Path) -> Result<()> {
    let reader = open_input(input)?;
    let report = pipeline::verify(reader, config.window_secs, config.search)?;

    match report.divergence {
        None => {
            println!(
                "✓ ordered ({}) and rescan backends agree on {} records",
                config.search, report.records
            );
            Ok(())
        }
        Some(divergence) => {
            anyhow::bail!(
                "Backends diverged at line {}: ordered {} vs rescan {}",
                divergence.line,
                divergence.ordered,
                divergence.rescan
            )
        }
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = match level.to_lowercase().as_str() {
        "error" => tracing::Level::ERROR,
        "warn" => tracing::Level::WARN,
        "info" => tracing::Level::INFO,
        "debug" => tracing::Level::DEBUG,
        "trace" => tracing::Level::TRACE,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter.to_string())),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    Ok(())
}
