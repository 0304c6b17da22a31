//! Consolidation of per-line station files into one deduplicated table.

use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::output::write_records;
use crate::stations::{StationRecord, line_csv_path, read_line_csv};

/// Header of the consolidated station file.
pub const STATION_COLUMNS: [&str; 3] = ["station_name", "lat", "lon"];

/// Removes rows that repeat an earlier row on all three fields, keeping the
/// first occurrence.
pub fn dedup_stations(rows: impl IntoIterator<Item = StationRecord>) -> Vec<StationRecord> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|s| seen.insert((s.name.clone(), float_key(s.lat), float_key(s.lon))))
        .collect()
}

/// Concatenates the per-line tables in order and deduplicates the result.
///
/// # Errors
///
/// [`Error::EmptyLineList`] when `tables` is empty. A non-empty list of
/// tables that happen to hold no rows yields an empty result.
pub fn aggregate_stations(tables: Vec<Vec<StationRecord>>) -> Result<Vec<StationRecord>> {
    if tables.is_empty() {
        return Err(Error::EmptyLineList);
    }
    let total: usize = tables.iter().map(Vec::len).sum();
    let stations = dedup_stations(tables.into_iter().flatten());
    debug!(total, unique = stations.len(), "Stations deduplicated");
    Ok(stations)
}

/// Reads `<dir>/<line_id>.csv` for every identifier and aggregates them.
///
/// Every file must exist; a missing one means ingestion did not complete.
#[tracing::instrument(skip_all, fields(lines = line_ids.len(), dir = %dir.as_ref().display()))]
pub fn aggregate_line_files(line_ids: &[String], dir: impl AsRef<Path>) -> Result<Vec<StationRecord>> {
    if line_ids.is_empty() {
        return Err(Error::EmptyLineList);
    }

    let mut tables = Vec::with_capacity(line_ids.len());
    for line_id in line_ids {
        let path = line_csv_path(dir.as_ref(), line_id);
        if !path.is_file() {
            return Err(Error::MissingLineFile {
                line_id: line_id.clone(),
                path,
            });
        }
        tables.push(read_line_csv(&path)?);
    }

    aggregate_stations(tables)
}

/// Writes the consolidated table with exactly the columns
/// `station_name,lat,lon`.
pub fn write_station_coords(path: impl AsRef<Path>, stations: &[StationRecord]) -> Result<()> {
    let path = path.as_ref();
    let rows = write_records(path, &STATION_COLUMNS, stations)?;
    info!(path = %path.display(), rows, "Station coordinates written");
    Ok(())
}

// Equal floats get equal keys, so 0.0 and -0.0 collapse.
fn float_key(v: f64) -> u64 {
    if v == 0.0 { 0 } else { v.to_bits() }
}
