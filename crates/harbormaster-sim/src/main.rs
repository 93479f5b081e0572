//! Harbormaster Headless Simulation Harness
//!
//! Runs the tower's main cycle until every dock is taken and settled, then
//! the drain until the harbor is empty, drawing the grid each cycle.
//!
//! Usage:
//!   cargo run -p harbormaster-sim
//!   cargo run -p harbormaster-sim -- --seed 42 --delay 0 --quiet
//!   cargo run -p harbormaster-sim -- --config harbor.json --export fleet.jsonl

mod display;

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;

use harbormaster_logic::config::SimConfig;
use harbormaster_logic::dice::SeededDice;
use harbormaster_logic::error::ConfigError;
use harbormaster_logic::observer::FleetExport;
use harbormaster_logic::tower::{RunReport, Tower};

use display::AsciiDisplay;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless harbor traffic simulation", long_about = None)]
struct Args {
    /// JSON config file; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pause between cycles (milliseconds)
    #[arg(long)]
    delay: Option<u64>,

    /// Number docks down the left edge then the right instead of shuffling
    #[arg(long)]
    ordered_docks: bool,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Minimum log level (off, error, warn, info, debug, trace)
    #[arg(long)]
    verbosity: Option<String>,

    /// Chance (0-100) of a new arrival each cycle
    #[arg(long)]
    arrival_percent: Option<u8>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Write every admitted vessel as a JSON line to this file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Do not draw the harbor
    #[arg(long)]
    quiet: bool,

    /// Send log output to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (loaded, config_error) = load_config(args.config.as_deref());
    let merged = apply_overrides(loaded, &args);
    init_logger(merged.level_filter(), args.log_file.as_deref())?;
    if let Some(err) = config_error {
        log::warn!("{}; falling back to defaults", err);
    }
    let config = merged.sanitized();
    log::info!("Starting with {:?}", config);

    let mut tower = Tower::from_config(&config, SeededDice::new(config.seed));
    if !args.quiet {
        tower.add_observer(Box::new(AsciiDisplay::new(io::stdout())));
    }
    if let Some(path) = &config.export_path {
        let file = File::create(path)
            .with_context(|| format!("Failed to create export file {}", path.display()))?;
        tower.add_observer(Box::new(FleetExport::new(BufWriter::new(file))));
    }

    println!(
        "=== Harbormaster: {}x{} harbor, {} docks ===",
        tower.harbor().width(),
        tower.harbor().height(),
        tower.harbor().dock_count()
    );

    let main_report = tower.run_cycle();
    let drain_report = tower.run_drain();
    tower.finish();

    print_summary("Main cycle", &main_report);
    print_summary("Drain", &drain_report);
    Ok(())
}

// ── Configuration ───────────────────────────────────────────────────────

fn load_config(path: Option<&Path>) -> (SimConfig, Option<ConfigError>) {
    match path {
        None => (SimConfig::default(), None),
        Some(path) => match SimConfig::from_file(path) {
            Ok(config) => (config, None),
            Err(err) => (SimConfig::default(), Some(err)),
        },
    }
}

/// Command-line flags win over the config file.
fn apply_overrides(mut config: SimConfig, args: &Args) -> SimConfig {
    if let Some(delay) = args.delay {
        config.cycle_delay_ms = delay;
    }
    if args.ordered_docks {
        config.shuffle_docks = false;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(level) = &args.verbosity {
        config.log_level = level.clone();
    }
    if let Some(percent) = args.arrival_percent {
        config.arrival_percent = percent;
    }
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if args.export.is_some() {
        config.export_path = args.export.clone();
    }
    config
}

// ── Logging ─────────────────────────────────────────────────────────────

fn init_logger(level: LevelFilter, log_file: Option<&Path>) -> Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).format_timestamp_millis();
    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init().context("Failed to install logger")?;
    Ok(())
}

// ── Summary ─────────────────────────────────────────────────────────────

fn print_summary(title: &str, report: &RunReport) {
    println!("\n--- {} ---", title);
    println!("  cycles:      {}", report.cycles);
    println!("  admitted:    {}", report.admitted);
    println!("  queued:      {}", report.queued);
    println!("  stranded:    {}", report.stranded);
    println!("  rejected:    {}", report.rejected);
    println!("  preemptions: {}", report.preemptions);
    println!("  collisions:  {}", report.collisions);
    println!("  drained:     {}", report.drained);
    println!("  evicted:     {}", report.evicted);
    println!("  destroyed:   {}", report.destroyed());
    if report.hit_cap {
        println!("  (stopped at the cycle cap)");
    }
}
