//! Nullcheck CLI - NULL-file compression checks for GRASS rasters

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use nullcheck_core::{
    EngineOptions, NullCompression, ProcessEngine, Session, Univariate, COMPRESS_NULLS_VAR,
};
use nullcheck_suite::{
    assert_raster_fits_univar, validate_precision, Case, Outcome, SuiteConfig, SuiteRunner,
};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "nullcheck")]
#[command(author, version, about = "Check that GRASS NULL-file compression preserves raster data", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// GRASS launcher executable (used with --mapset)
    #[arg(long, global = true, default_value = "grass")]
    grass: String,

    /// Mapset to run modules in via `grass <mapset> --exec`.
    /// Omit when already inside a GRASS session.
    #[arg(long, global = true)]
    mapset: Option<String>,

    /// Initial GRASS_COMPRESS_NULLS value (0 or 1)
    #[arg(long, global = true)]
    compress_nulls: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the compression-invariance cases
    Run {
        /// Case to run: single-map, mapcalc-addition (default: all)
        #[arg(long = "case")]
        cases: Vec<String>,
        /// Reference raster providing the larger region
        #[arg(long)]
        reference: Option<String>,
        /// Tolerance for comparing statistics
        #[arg(short, long)]
        precision: Option<f64>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show whether the NULL file of raster maps is compressed
    Status {
        /// Raster maps
        #[arg(required = true)]
        maps: Vec<String>,
    },
    /// Print univariate statistics of a raster map
    Univar {
        /// Raster map
        map: String,
    },
    /// Compare a raster's statistics against saved `r.univar -g` output
    Compare {
        /// Raster map
        map: String,
        /// File with reference statistics
        #[arg(short, long)]
        reference: PathBuf,
        /// Tolerance for comparing statistics
        #[arg(short, long)]
        precision: Option<f64>,
    },
    /// Print the effective configuration as JSON
    Config,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Defaults, then the config file, then command-line flags
fn load_config(cli: &Cli) -> Result<SuiteConfig> {
    let mut config = match &cli.config {
        Some(path) => SuiteConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SuiteConfig::default(),
    };

    if let Some(mapset) = &cli.mapset {
        config.engine = EngineOptions {
            extra_env: config.engine.extra_env,
            ..EngineOptions::grass_exec(cli.grass.as_str(), mapset.as_str())
        };
    }
    if let Some(value) = &cli.compress_nulls {
        config.initial_compression =
            NullCompression::parse(value).context("Invalid --compress-nulls")?;
    }
    Ok(config)
}

fn parse_cases(names: &[String]) -> Result<Vec<Case>> {
    if names.is_empty() {
        return Ok(Case::ALL.to_vec());
    }
    names
        .iter()
        .map(|n| n.parse::<Case>().map_err(anyhow::Error::from))
        .collect()
}

/// Tolerance for `compare`: the flag if given, else the config value
fn compare_precision(config: &SuiteConfig, flag: Option<f64>) -> Result<f64> {
    let precision = flag.unwrap_or(config.precision);
    validate_precision(precision).context("Invalid --precision")?;
    Ok(precision)
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Run {
            cases,
            reference,
            precision,
            json,
        } => {
            if let Some(reference) = reference {
                config.reference_raster = reference;
            }
            if let Some(precision) = precision {
                config.precision = precision;
            }
            let cases = parse_cases(&cases)?;
            info!(
                "{}={} initially, reference raster <{}>",
                COMPRESS_NULLS_VAR,
                config.initial_compression.as_env_value(),
                config.reference_raster
            );

            let engine = ProcessEngine::new(config.engine.clone());
            let mut runner = SuiteRunner::new(engine, config).context("Invalid configuration")?;

            let start = Instant::now();
            let pb = spinner("Preparing region...");
            let report = runner
                .run_with(&cases, |case| pb.set_message(format!("Running {case}...")))
                .context("Failed to set up the temporary region")?;
            pb.finish_and_clear();

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for case in &report.cases {
                    let status = match &case.outcome {
                        Outcome::Passed => "ok",
                        Outcome::Failed(_) => "FAILED",
                        Outcome::Error(_) => "ERROR",
                    };
                    println!("{} ... {} ({:.2?})", case.case, status, case.elapsed);
                }
                for case in report.failures() {
                    if let Outcome::Failed(msg) | Outcome::Error(msg) = &case.outcome {
                        println!("\n── {} ──\n{}", case.case, msg);
                    }
                }
                println!("  Total time: {:.2?}", start.elapsed());
            }

            if !report.passed() {
                anyhow::bail!("{} of {} cases failed", report.failures().count(), report.cases.len());
            }
        }

        Commands::Status { maps } => {
            let session = Session::new(ProcessEngine::new(config.engine), config.initial_compression);
            for map in &maps {
                let status = session
                    .null_file_status(map)
                    .with_context(|| format!("Failed to query <{map}>"))?;
                println!(
                    "{}: NULL file {}",
                    status.map,
                    if status.compressed { "compressed" } else { "uncompressed" }
                );
            }
        }

        Commands::Univar { map } => {
            let session = Session::new(ProcessEngine::new(config.engine), config.initial_compression);
            let stats = session
                .univar(&map)
                .with_context(|| format!("Failed to compute statistics of <{map}>"))?;
            print!("{stats}");
        }

        Commands::Compare {
            map,
            reference,
            precision,
        } => {
            let text = std::fs::read_to_string(&reference)
                .with_context(|| format!("Failed to read {}", reference.display()))?;
            Univariate::parse(&text).context("Invalid reference statistics")?;

            let precision = compare_precision(&config, precision)?;
            let session = Session::new(ProcessEngine::new(config.engine), config.initial_compression);
            assert_raster_fits_univar(&session, &map, &text, precision)?;
            println!("<{map}> fits reference within {precision}");
        }

        Commands::Config => {
            println!("{}", config.to_json()?);
        }
    }

    Ok(())
}
