mod output;
mod simulate;

use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use engine::AssessmentConfig;
use tracing::info;

use crate::simulate::{Participant, ParticipantProfile};

#[derive(Parser)]
#[command(name = "neuroloop")]
#[command(about = "Play assessment runs against a simulated participant")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Seed for both the engines and the participant
    #[arg(long, global = true, default_value_t = 1)]
    seed: u64,

    /// Probability that the participant answers a trial correctly
    #[arg(long, global = true, default_value_t = 0.85)]
    accuracy: f64,

    /// Mean reaction time in milliseconds
    #[arg(long = "rt-mean", global = true, default_value_t = 550.0)]
    rt_mean: f64,

    /// Probability of sorting by the previous rule right after a switch
    #[arg(long, global = true, default_value_t = 0.5)]
    perseveration: f64,

    /// JSON configuration file
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Print summary records as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Adaptive N-back
    Nback,
    /// Go/No-Go Stroop
    Stroop,
    /// Card sorting with rule switches
    Sorting,
    /// All three tasks in sequence
    All,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    ensure!((0.0..=1.0).contains(&cli.accuracy), "--accuracy must be in [0, 1]");
    ensure!((0.0..=1.0).contains(&cli.perseveration), "--perseveration must be in [0, 1]");
    ensure!(cli.rt_mean > 0.0, "--rt-mean must be positive");

    let config = match &cli.config {
        Some(path) => {
            info!("Loading config from: {:?}", path);
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            AssessmentConfig::from_json_str(&raw)
                .with_context(|| format!("invalid configuration in {}", path.display()))?
        }
        None => AssessmentConfig::default(),
    };

    let mut participant = Participant::new(
        ParticipantProfile {
            accuracy: cli.accuracy,
            rt_mean_ms: cli.rt_mean,
            perseveration: cli.perseveration,
        },
        cli.seed,
    );

    let wants = |task: Commands| cli.command == task || cli.command == Commands::All;
    let mut records = Vec::new();
    if wants(Commands::Nback) {
        records.push(simulate::run_nback(config.nback.clone(), cli.seed, &mut participant)?);
    }
    if wants(Commands::Stroop) {
        records.push(simulate::run_stroop(config.stroop.clone(), cli.seed, &mut participant)?);
    }
    if wants(Commands::Sorting) {
        records.push(simulate::run_sorting(config.sorting.clone(), cli.seed, &mut participant)?);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        records.iter().for_each(output::print_record);
    }
    Ok(())
}

fn init_tracing(debug: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_filter = if debug {
        "engine=debug,neuroloop=debug"
    } else {
        "engine=info,neuroloop=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
