//! Graveyard CLI — ticker mortality index over monthly OHLCV snapshots.
//!
//! Commands:
//! - `census` — scan every monthly snapshot once and build the ticker
//!   census (birth/death months, price extrema, alive/dead status)
//! - `extract` — read the census and compute ranked death metrics for
//!   the most liquid confirmed failures

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use graveyard_core::domain::MonthLabel;
use graveyard_runner::census::run_census;
use graveyard_runner::config::{CensusConfig, ExtractConfig, PipelineConfig};
use graveyard_runner::extract::run_extraction;
use graveyard_runner::progress::StdoutProgress;
use graveyard_runner::{CensusSummary, ExtractSummary};

#[derive(Parser)]
#[command(
    name = "graveyard",
    about = "Graveyard — ticker mortality census and failure extraction"
)]
struct Cli {
    /// TOML pipeline config; command-line flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan all monthly snapshots and build the ticker census.
    Census {
        /// Directory of monthly snapshot files.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Census output path.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Alive/dead cutoff month (YYYY-MM).
        #[arg(long)]
        cutoff: Option<String>,

        /// Write a checkpoint every N files (0 disables).
        #[arg(long)]
        checkpoint_every: Option<usize>,
    },
    /// Extract ranked death metrics for the most liquid failures.
    Extract {
        /// Directory of monthly snapshot files.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Census table produced by `census`.
        #[arg(long)]
        census: Option<PathBuf>,

        /// Metrics output path.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Minimum destruction percentage for a candidate (0..1).
        #[arg(long)]
        min_destruction: Option<f64>,

        /// Cap on the ranked output.
        #[arg(long)]
        sample_size: Option<usize>,

        /// Cap on the lifespan-ranked candidate pool.
        #[arg(long)]
        search_pool: Option<usize>,

        /// Minimum death-month trace rows (liquidity floor).
        #[arg(long)]
        min_rows: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let base = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Commands::Census {
            data_dir,
            output,
            cutoff,
            checkpoint_every,
        } => run_census_cmd(base.census, data_dir, output, cutoff, checkpoint_every),
        Commands::Extract {
            data_dir,
            census,
            output,
            min_destruction,
            sample_size,
            search_pool,
            min_rows,
        } => run_extract_cmd(
            base.extract,
            data_dir,
            census,
            output,
            min_destruction,
            sample_size,
            search_pool,
            min_rows,
        ),
    }
}

fn run_census_cmd(
    mut config: CensusConfig,
    data_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    cutoff: Option<String>,
    checkpoint_every: Option<usize>,
) -> Result<()> {
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    if let Some(path) = output {
        config.census_path = path;
    }
    if let Some(month) = cutoff {
        config.cutoff_month = MonthLabel::new(month);
    }
    if let Some(every) = checkpoint_every {
        config.checkpoint_every = every;
    }

    let summary = run_census(&config, &StdoutProgress)
        .with_context(|| format!("census over {}", config.data_dir.display()))?;
    print_census_summary(&summary);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_extract_cmd(
    mut config: ExtractConfig,
    data_dir: Option<PathBuf>,
    census: Option<PathBuf>,
    output: Option<PathBuf>,
    min_destruction: Option<f64>,
    sample_size: Option<usize>,
    search_pool: Option<usize>,
    min_rows: Option<usize>,
) -> Result<()> {
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    if let Some(path) = census {
        config.census_path = path;
    }
    if let Some(path) = output {
        config.metrics_path = path;
    }
    if let Some(threshold) = min_destruction {
        config.min_destruction = threshold;
    }
    if let Some(n) = sample_size {
        config.sample_size = n;
    }
    if let Some(n) = search_pool {
        config.search_pool = n;
    }
    if let Some(n) = min_rows {
        config.min_trace_rows = n;
    }

    let summary = run_extraction(&config, &StdoutProgress)
        .with_context(|| format!("extraction from {}", config.census_path.display()))?;
    print_extract_summary(&summary);
    Ok(())
}

fn print_census_summary(summary: &CensusSummary) {
    println!();
    println!("=== Census Complete ===");
    println!(
        "Files scanned:   {} ({} skipped)",
        summary.files_scanned, summary.files_skipped
    );
    println!("Total tickers:   {}", summary.total_tickers);
    println!("Alive:           {}", summary.alive);
    println!("Dead/Delisted:   {}", summary.dead);
    println!();
    println!("Census saved to: {}", summary.census_path.display());
}

fn print_extract_summary(summary: &ExtractSummary) {
    println!();
    println!("=== Extraction Complete ===");
    println!("Census rows:     {}", summary.census_rows);
    println!(
        "Candidates:      {} ({} pooled by lifespan)",
        summary.candidates, summary.pool
    );
    println!(
        "Files read:      {} ({} missing, {} unreadable)",
        summary.files_read, summary.files_missing, summary.files_skipped
    );
    println!("Metric records:  {}", summary.records);
    match &summary.metrics_path {
        Some(path) => println!("Top sample saved to: {}", path.display()),
        None if summary.candidates == 0 => {
            println!("No candidates meet the destruction threshold; nothing to extract.");
        }
        None => {
            println!("No traces passed the liquidity floor; nothing written.");
        }
    }
}
