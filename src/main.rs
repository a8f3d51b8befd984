mod input;
mod model;
mod pipeline;
mod report;
mod tracing;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::input::load_raw_table;
use crate::model::profile::{DetectionProfile, load_profile};
use crate::pipeline::stage8_report::{Stage8Input, write_reports};
use crate::pipeline::{PipelineError, run_pipeline};

#[derive(Debug, Parser)]
#[command(
    name = "kira-kpianomaly",
    version,
    about = "Per-entity KPI anomaly detection with synthetic-label hyperparameter search"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score a KPI table and write anomaly, RCA and quality reports.
    Run(RunArgs),
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// Input table (.csv, .tsv, optionally .gz).
    #[arg(long)]
    input: PathBuf,
    /// Output directory.
    #[arg(long)]
    out: PathBuf,
    /// JSON detection profile; unset fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    entity_column: Option<String>,
    #[arg(long)]
    date_column: Option<String>,
    #[arg(long)]
    injection_rate: Option<f64>,
    /// Seed for anomaly injection; random when omitted.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    model_seed: Option<u64>,
    /// Scoring worker threads (0 = all cores).
    #[arg(long)]
    threads: Option<usize>,
}

fn main() {
    crate::tracing::init_tracing();
    if let Err(err) = run() {
        ::tracing::error!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), PipelineError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run_command(&args),
    }
}

fn run_command(args: &RunArgs) -> Result<(), PipelineError> {
    let started = std::time::Instant::now();
    let profile = resolve_profile(args)?;

    let raw = load_raw_table(&args.input)?;
    let mut rng = match profile.injection_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let output = run_pipeline(raw, &profile, &mut rng)?;

    write_reports(
        &Stage8Input {
            table: &output.table,
            partitions: &output.partitions,
            anomalies: &output.anomalies,
            best_configs: &output.best_configs,
            rca: &output.rca,
            quality: &output.quality,
            injected_rows: output.injected_rows.len(),
            profile: &profile,
            input_path: args.input.display().to_string(),
            tool_name: "kira-kpianomaly".to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        },
        &args.out,
    )?;

    ::tracing::info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "run complete"
    );
    Ok(())
}

/// Defaults, then the profile file, then command-line overrides.
fn resolve_profile(args: &RunArgs) -> Result<DetectionProfile, PipelineError> {
    let mut profile = match &args.config {
        Some(path) => load_profile(path)?,
        None => DetectionProfile::default_v1(),
    };
    if let Some(v) = &args.entity_column {
        profile.entity_column = v.clone();
    }
    if let Some(v) = &args.date_column {
        profile.date_column = v.clone();
    }
    if let Some(v) = args.injection_rate {
        profile.injection_rate = v;
    }
    if let Some(v) = args.seed {
        profile.injection_seed = Some(v);
    }
    if let Some(v) = args.model_seed {
        profile.model_seed = v;
    }
    if let Some(v) = args.threads {
        profile.threads = v;
    }
    profile.validate()?;
    Ok(profile)
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
