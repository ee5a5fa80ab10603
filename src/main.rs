//! Cache Durability Model
//!
//! Command-line driver: evaluates a built-in scenario suite, or the models
//! in a YAML/JSON file, and prints a durability report.
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ suite / file │──►│ ModelConfig  │──►│  run_suite   │──►│ table / JSON │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────────┘
//! ```

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cache_durability_model::report::render;
use cache_durability_model::units::{PB, YEAR};
use cache_durability_model::{run_suite, Error, EvaluationParams, ModelConfig, Suite, Verbosity};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Cache Durability Model - loss probabilities for mirrored write-back caches
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Built-in scenario suite (default, nvram-ber)
    #[arg(long, env = "DURABILITY_SUITE", default_value = "default")]
    suite: Suite,

    /// YAML or JSON file of models, evaluated instead of the suite
    #[arg(long, env = "DURABILITY_CONFIG")]
    config: Option<PathBuf>,

    /// Backing-store capacity in petabytes
    #[arg(long, env = "DURABILITY_CAPACITY_PB", default_value = "1")]
    capacity_pb: f64,

    /// Modeled period in years
    #[arg(long, env = "DURABILITY_PERIOD_YEARS", default_value = "1")]
    period_years: f64,

    /// Component repair time in hours, overriding every model's own
    #[arg(long, env = "DURABILITY_REPAIR_HOURS")]
    repair_hours: Option<f64>,

    /// Report sections (default, parameters, headings, data, all, debug)
    #[arg(long, env = "DURABILITY_VERBOSITY", default_value = "default")]
    verbosity: Verbosity,

    /// Print evaluations as JSON instead of a table
    #[arg(long, env = "DURABILITY_JSON")]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(&args);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            let code = err.downcast_ref::<Error>().map(Error::exit_code).unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    info!("Starting {} v{}", cache_durability_model::NAME, cache_durability_model::VERSION);

    let models = match &args.config {
        Some(path) => ModelConfig::load_file(path)
            .with_context(|| format!("loading models from {}", path.display()))?,
        None => {
            info!("  Suite: {}", args.suite);
            args.suite.models()?
        }
    };

    let params = EvaluationParams {
        capacity: args.capacity_pb * PB,
        period: args.period_years * YEAR,
        repair: args.repair_hours,
    };
    let evaluations = run_suite(&models, &params)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&evaluations)?);
    } else {
        print!("{}", render(&evaluations, params.period, args.verbosity));
    }

    info!("Evaluated {} models", evaluations.len());
    Ok(())
}

// =============================================================================
// Logging
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    if args.verbosity.wants_trace() {
        if let Ok(directive) = "cache_durability_model::model=debug".parse() {
            filter = filter.add_directive(directive);
        }
    }

    // reports own stdout
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
