//! CLI entry point for the transit coordinate tools.
//!
//! Subcommands fetch London station lists per line and consolidate them,
//! clip and reproject point datasets, measure how much of each city's
//! population lives near a station, and merge city tables for comparison.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use transit_coords::{
    Error,
    access::{run_props, run_quadrants, run_stations_within},
    clip::{clip_table, load_boundary},
    combine::combine_cities,
    config::Settings,
    datasets::{City, Dataset},
    infra::tfl::TflClient,
    ingest::FailurePolicy,
    pipeline::{run_aggregate, run_fetch, run_stations},
    reproject::reproject_dataset,
};

/// Exit status for bad arguments or inconsistent inputs.
const CONFIG_EXIT_CODE: i32 = 2;

#[derive(Parser)]
#[command(name = "transit_coords")]
#[command(about = "Fetch, consolidate and reproject transit station coordinates", long_about = None)]
struct Cli {
    /// Data directory (overrides TRANSIT_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Transit API base URL (overrides TFL_API_BASE)
    #[arg(long, global = true)]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the stop points of every line and write one CSV per line
    FetchStations {
        /// Line identifier file (default: <data-dir>/london_trains/lines/line_ids.txt)
        #[arg(long)]
        lines: Option<PathBuf>,

        /// Directory for per-line CSVs
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Keep fetching remaining lines after a failure
        #[arg(long, default_value_t = false)]
        keep_going: bool,
    },
    /// Merge per-line CSVs into one deduplicated station table
    AggregateStations {
        /// Line identifier file
        #[arg(long)]
        lines: Option<PathBuf>,

        /// Directory holding per-line CSVs
        #[arg(short, long)]
        in_dir: Option<PathBuf>,

        /// Consolidated output CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Fetch then aggregate; aggregation only runs if every line was fetched
    Stations {
        /// Keep fetching remaining lines after a failure
        #[arg(long, default_value_t = false)]
        keep_going: bool,
    },
    /// Add Web Mercator x/y columns to a point dataset
    Reproject {
        /// One of: london_trains, tokyo_trains, london_pp, tokyo_pp
        #[arg(value_name = "DATASET", value_parser = Dataset::from_str)]
        dataset: Dataset,
    },
    /// Keep only the population points inside a boundary GeoJSON
    Clip {
        /// london or tokyo
        #[arg(value_name = "CITY", value_parser = City::from_str)]
        city: City,

        /// Boundary polygons (GeoJSON)
        #[arg(long)]
        boundary: PathBuf,

        /// Raw population point CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Clipped CSV (default: the city's population dataset path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Share of population within 100..3000 m of the nearest station
    Props {
        /// london or tokyo (default: both)
        #[arg(value_name = "CITY", value_parser = City::from_str)]
        city: Option<City>,
    },
    /// Stations within 100..3000 m of every population point
    StationsWithinPp {
        /// london or tokyo (default: both)
        #[arg(value_name = "CITY", value_parser = City::from_str)]
        city: Option<City>,
    },
    /// Population against nearby station count, split at the upper quartiles
    Quadrants {
        /// Search radius in meters
        #[arg(value_name = "MAX_DIST")]
        max_dist: f64,

        /// london or tokyo (default: both)
        #[arg(value_name = "CITY", value_parser = City::from_str)]
        city: Option<City>,
    },
    /// Concatenate london_<TABLE>.csv and tokyo_<TABLE>.csv with a city column
    Combine {
        #[arg(value_name = "TABLE")]
        table: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Arguments first: a rejected command line never touches the log directory
    let cli = Cli::parse();
    let file_guard = init_logging()?;

    match run(cli).await {
        Err(e) if is_config_error(&e) => {
            error!(error = %format!("{e:#}"), "Configuration error");
            drop(file_guard);
            std::process::exit(CONFIG_EXIT_CODE);
        }
        other => other,
    }
}

/// Colored stderr plus a JSON rolling log file. The returned guard flushes
/// the file writer when dropped.
fn init_logging() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/transit_coords.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("transit_coords.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(file_guard)
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::from_env();
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }
    if let Some(base) = cli.api_base {
        settings.api_base = base;
    }
    let layout = settings.layout();

    match cli.command {
        Commands::FetchStations {
            lines,
            out_dir,
            keep_going,
        } => {
            let lines = lines.unwrap_or_else(|| layout.line_ids_file());
            let out_dir = out_dir.unwrap_or_else(|| layout.line_csv_dir());

            let client = TflClient::new(&settings.api_base)?;
            let report = run_fetch(&client, &lines, &out_dir, policy(keep_going))
                .await
                .with_context(|| format!("fetching lines listed in {}", lines.display()))?;

            if !report.is_complete() {
                let failed: Vec<_> = report.failed.iter().map(|(id, _)| id.as_str()).collect();
                bail!("{} line(s) failed: {}", failed.len(), failed.join(", "));
            }
        }
        Commands::AggregateStations {
            lines,
            in_dir,
            output,
        } => {
            let lines = lines.unwrap_or_else(|| layout.line_ids_file());
            let in_dir = in_dir.unwrap_or_else(|| layout.line_csv_dir());
            let output = output.unwrap_or_else(|| layout.station_coords_file());

            run_aggregate(&lines, &in_dir, &output)
                .with_context(|| format!("aggregating lines listed in {}", lines.display()))?;
        }
        Commands::Stations { keep_going } => {
            let client = TflClient::new(&settings.api_base)?;
            let outcome = run_stations(&client, &layout, policy(keep_going)).await?;

            if outcome.station_coords.is_none() {
                bail!(
                    "{} line(s) failed, station table not rebuilt",
                    outcome.ingest.failed.len()
                );
            }
        }
        Commands::Reproject { dataset } => {
            let summary = reproject_dataset(dataset, &settings.data_dir)?;
            info!(
                dataset = %dataset,
                rows = summary.rows,
                output = %summary.output.display(),
                "Reprojection complete"
            );
        }
        Commands::Clip {
            city,
            boundary,
            input,
            output,
        } => {
            let dataset = city.population();
            let output = output.unwrap_or_else(|| dataset.input_path(&settings.data_dir));
            let polygons = load_boundary(&boundary)
                .with_context(|| format!("loading boundary {}", boundary.display()))?;
            let config = dataset.config();
            let summary = clip_table(&polygons, &input, &output, config.lon_column, config.lat_column)?;
            info!(
                city = %city,
                kept = summary.kept,
                dropped = summary.dropped,
                output = %summary.output.display(),
                "Clip complete"
            );
        }
        Commands::Props { city } => {
            for city in cities(city) {
                run_props(city, &settings.data_dir)?;
            }
        }
        Commands::StationsWithinPp { city } => {
            for city in cities(city) {
                run_stations_within(city, &settings.data_dir)?;
            }
        }
        Commands::Quadrants { max_dist, city } => {
            if !(max_dist.is_finite() && max_dist > 0.0) {
                bail!("search radius must be a positive number of meters, got {max_dist}");
            }
            for city in cities(city) {
                run_quadrants(city, &settings.data_dir, max_dist)?;
            }
        }
        Commands::Combine { table } => {
            if table.is_empty() || table.contains(['/', '\\']) {
                bail!("invalid table name {table:?}");
            }
            let output = combine_cities(&table, &settings.data_dir)?;
            info!(output = %output.display(), "Combined table written");
        }
    }

    Ok(())
}

fn cities(city: Option<City>) -> Vec<City> {
    city.map_or_else(|| City::ALL.to_vec(), |c| vec![c])
}

fn is_config_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<Error>().is_some_and(Error::is_config)
}

fn policy(keep_going: bool) -> FailurePolicy {
    if keep_going {
        warn!("Continuing past failed lines; aggregation will be skipped if any fail");
        FailurePolicy::Continue
    } else {
        FailurePolicy::Abort
    }
}
