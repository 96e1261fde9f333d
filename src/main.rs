use clap::{Parser, ValueEnum};
use royaltyoptimizer::logging::LoggingConfig;
use royaltyoptimizer::{
    ObjectiveStrategy, OptimizerConfig, PricingOptimizer, demo_catalog, load_catalog, load_config,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Royalty-maximising prices across distribution platforms.
#[derive(Parser, Debug)]
#[command(name = "royaltyoptimizer")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Platform catalog (JSON); the built-in book catalog when omitted
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Optimizer configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// How separation and spread rules are enforced
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Minimum royalty gap between adjacent margin tiers
    #[arg(long)]
    min_royalty_diff: Option<f64>,

    /// Maximum price window within a margin tier
    #[arg(long)]
    max_spread: Option<f64>,

    /// Solver iteration cap
    #[arg(long)]
    max_iterations: Option<u32>,

    /// Log every solver iteration (raises the default log level to debug)
    #[arg(long)]
    verbose: bool,

    /// Use the greedy tier walk instead of the solver
    #[arg(long, conflicts_with = "sweep")]
    greedy: bool,

    /// Solve once per separation value, e.g. `--sweep 0.3,0.5,1.0`
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    sweep: Option<Vec<f64>>,

    /// Log filter when RUST_LOG is unset [default: info, or debug with --verbose]
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, default_value = "pretty", value_parser = ["pretty", "json"])]
    log_format: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Hard,
    Penalty,
}

impl From<Mode> for ObjectiveStrategy {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Hard => ObjectiveStrategy::HardConstraint,
            Mode::Penalty => ObjectiveStrategy::PenaltyAugmented,
        }
    }
}

impl Cli {
    fn log_level(&self) -> String {
        match &self.log_level {
            Some(level) => level.clone(),
            None if self.verbose => "debug".to_string(),
            None => "info".to_string(),
        }
    }

    fn optimizer_config(&self) -> Result<OptimizerConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => OptimizerConfig::default(),
        };
        if let Some(mode) = self.mode {
            config = config.with_mode(mode.into());
        }
        if let Some(diff) = self.min_royalty_diff {
            config = config.with_min_royalty_diff(diff);
        }
        if let Some(spread) = self.max_spread {
            config = config.with_max_spread(spread);
        }
        if let Some(max_iterations) = self.max_iterations {
            config = config.with_max_iterations(max_iterations);
        }
        if self.verbose {
            config = config.with_verbose(true);
        }
        Ok(config)
    }
}

fn run(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let platforms = match &cli.catalog {
        Some(path) => load_catalog(path)?,
        None => demo_catalog(),
    };
    let optimizer = PricingOptimizer::new(cli.optimizer_config()?);
    info!(
        platforms = platforms.len(),
        mode = optimizer.config().mode.as_str(),
        "royaltyoptimizer starting"
    );

    let output = if let Some(diffs) = &cli.sweep {
        let runs = optimizer.sweep_min_royalty_diff(&platforms, diffs)?;
        let feasible = runs.iter().all(|(_, solution)| solution.feasible);
        let rows: Vec<serde_json::Value> = runs
            .into_iter()
            .map(|(min_royalty_diff, solution)| {
                serde_json::json!({ "min_royalty_diff": min_royalty_diff, "solution": solution })
            })
            .collect();
        (serde_json::to_string_pretty(&rows)?, feasible)
    } else {
        let solution = if cli.greedy {
            optimizer.greedy_baseline(&platforms)?
        } else {
            optimizer.optimize(&platforms)?
        };
        (serde_json::to_string_pretty(&solution)?, solution.feasible)
    };

    println!("{}", output.0);
    Ok(output.1)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    LoggingConfig::new(cli.log_level(), cli.log_format.clone()).init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        // Infeasible: the diagnostic is already in the printed solution
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            error!(error = %e, "royaltyoptimizer failed");
            ExitCode::FAILURE
        }
    }
}
