//! End-to-end London station pipeline: line list, ingestion, aggregation.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::aggregate::{aggregate_line_files, write_station_coords};
use crate::config::DataLayout;
use crate::error::Result;
use crate::ingest::{FailurePolicy, IngestReport, ingest_lines};
use crate::lines::read_line_ids;
use crate::services::stop_points::StopPointSource;

/// Result of [`run_stations`]. `station_coords` is `None` when aggregation
/// was skipped because some lines failed to ingest.
#[derive(Debug)]
pub struct StationsOutcome {
    pub ingest: IngestReport,
    pub station_coords: Option<PathBuf>,
}

/// Reads the line list at `lines`, aggregates the per-line files found in
/// `in_dir` and writes the consolidated station table to `output`. Returns
/// the number of unique stations.
pub fn run_aggregate(lines: &Path, in_dir: &Path, output: &Path) -> Result<usize> {
    let line_ids = read_line_ids(lines)?;
    let stations = aggregate_line_files(&line_ids, in_dir)?;
    write_station_coords(output, &stations)?;
    info!(unique = stations.len(), output = %output.display(), "Station table written");
    Ok(stations.len())
}

/// Reads the line list at `lines` and fetches every line into `out_dir`.
///
/// # Errors
///
/// [`crate::Error::EmptyLineList`] when the list has no entries, before any
/// request is made.
pub async fn run_fetch<S: StopPointSource + ?Sized>(
    source: &S,
    lines: &Path,
    out_dir: &Path,
    policy: FailurePolicy,
) -> Result<IngestReport> {
    let line_ids = read_line_ids(lines)?;
    ingest_lines(source, &line_ids, out_dir, policy).await
}

/// Fetches every line, then aggregates, but only when ingestion completed
/// for all lines.
pub async fn run_stations<S: StopPointSource + ?Sized>(
    source: &S,
    layout: &DataLayout,
    policy: FailurePolicy,
) -> Result<StationsOutcome> {
    let line_ids = read_line_ids(layout.line_ids_file())?;
    let ingest = ingest_lines(source, &line_ids, layout.line_csv_dir(), policy).await?;

    if !ingest.is_complete() {
        warn!(
            failed = ingest.failed.len(),
            "Skipping aggregation, ingestion incomplete"
        );
        return Ok(StationsOutcome {
            ingest,
            station_coords: None,
        });
    }

    let stations = aggregate_line_files(&line_ids, layout.line_csv_dir())?;
    let path = layout.station_coords_file();
    write_station_coords(&path, &stations)?;
    info!(unique = stations.len(), "Station pipeline complete");

    Ok(StationsOutcome {
        ingest,
        station_coords: Some(path),
    })
}
