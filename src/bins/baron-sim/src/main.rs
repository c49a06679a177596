//! BARON handover simulator
//!
//! Runs handover sessions between a terminal, twelve access nodes and two
//! AMFs, optionally under attack by a rogue node, and reports the execution
//! time per scenario.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use baron_core::log::log_init;
use baron_core::SimConfig;
use baron_sim::stats::write_csv;
use baron_sim::{Simulation, SimulationReport};
use clap::{Parser, ValueEnum};

/// Handover procedure variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Plain handover, no tokens
    Standard,
    /// BARON-secured handover
    Patched,
}

/// BARON handover simulator
#[derive(Parser, Debug)]
#[command(name = "baron-sim")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Simulate BARON-secured 5G handover with a rogue base station")]
struct Args {
    /// Configuration file path (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Handover variant, overrides `secured`
    #[arg(short, long, value_enum)]
    mode: Option<Mode>,

    /// Spawn the rogue node
    #[arg(long, overrides_with = "no_attacker")]
    attacker: bool,

    /// Run without the rogue node
    #[arg(long, overrides_with = "attacker")]
    no_attacker: bool,

    /// Samples per scenario bucket
    #[arg(short, long)]
    rounds: Option<usize>,

    /// RNG seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Directory for `results<k>_<mode>.csv` files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

impl Args {
    fn attacker_present(&self) -> Option<bool> {
        if self.attacker {
            Some(true)
        } else if self.no_attacker {
            Some(false)
        } else {
            None
        }
    }
}

fn load_config(args: &Args) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => SimConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => SimConfig::default(),
    };

    if let Some(mode) = args.mode {
        config.secured = mode == Mode::Patched;
    }
    if let Some(attacker) = args.attacker_present() {
        config.attacker_present = attacker;
    }
    if let Some(rounds) = args.rounds {
        config.rounds = rounds;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn print_summary(report: &SimulationReport) {
    println!(
        "Mode: {} handover, attacker {}",
        if report.secured { "patched" } else { "standard" },
        if report.attacker_present { "present" } else { "absent" }
    );
    println!(
        "Sessions: {} ({} without handover, {} discarded)",
        report.sessions, report.skipped, report.discarded
    );
    for bucket in report.buckets() {
        let summary = report.summary(*bucket);
        match summary.median {
            Some(median) => println!(
                "SCENARIO {} ({}) - {} samples - MEDIAN: {:.9}",
                bucket.number(),
                bucket.name(),
                summary.count,
                median
            ),
            None => println!(
                "SCENARIO {} ({}) - {} samples - MEDIAN: n/a",
                bucket.number(),
                bucket.name(),
                summary.count
            ),
        }
    }
    println!("Outcomes: {}", report.outcomes);
}

fn write_results(dir: &Path, report: &SimulationReport) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    for bucket in report.buckets() {
        let path = dir.join(format!("results{}_{}.csv", bucket.number(), report.mode_tag()));
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        write_csv(&mut writer, &report.summary(*bucket).samples)
            .and_then(|()| writer.flush())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Wrote {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    log_init(&args.log_level);

    log::info!("baron-sim v{} starting", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args)?;
    let simulation = Simulation::new(config).context("Invalid configuration")?;
    let report = simulation.run().context("Simulation aborted")?;

    print_summary(&report);
    if let Some(dir) = &args.output_dir {
        write_results(dir, &report)?;
    }
    Ok(())
}
