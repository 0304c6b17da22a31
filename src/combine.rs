//! Side-by-side city tables for comparison charts.
//!
//! London and Tokyo results are stored as `<city>_<table>.csv` with the
//! same columns. Charts want them as one long table with a `city` column,
//! always spelled in lowercase.

use csv::StringRecord;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::datasets::City;
use crate::error::{Error, Result};
use crate::output::write_table;

pub const CITY_COLUMN: &str = "city";

/// `<data_dir>/<city>_<table>.csv`
pub fn city_table_path(data_dir: impl AsRef<Path>, city: City, table: &str) -> PathBuf {
    data_dir.as_ref().join(format!("{city}_{table}.csv"))
}

/// `<data_dir>/<table>_by_city.csv`
pub fn combined_path(data_dir: impl AsRef<Path>, table: &str) -> PathBuf {
    data_dir.as_ref().join(format!("{table}_by_city.csv"))
}

/// Concatenates the London and Tokyo versions of `table`, tagging each row
/// with its city, and writes the result to [`combined_path`].
pub fn combine_cities(table: &str, data_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let data_dir = data_dir.as_ref();
    let inputs: Vec<(City, PathBuf)> = City::ALL
        .iter()
        .map(|&c| (c, city_table_path(data_dir, c, table)))
        .collect();
    let output = combined_path(data_dir, table);
    combine_tables(&inputs, &output)?;
    Ok(output)
}

/// Concatenates `inputs` in order, appending a `city` column.
///
/// # Errors
///
/// [`Error::MismatchedColumns`] when the inputs do not share one header.
pub fn combine_tables(inputs: &[(City, PathBuf)], output: impl AsRef<Path>) -> Result<usize> {
    let mut headers: Option<(StringRecord, &Path)> = None;
    let mut rows = Vec::new();

    for (city, path) in inputs {
        let mut rdr = csv::Reader::from_reader(File::open(path)?);
        let current = rdr.headers()?.clone();

        if let Some((expected, first)) = &headers {
            if *expected != current {
                return Err(Error::MismatchedColumns {
                    left: first.to_path_buf(),
                    right: path.clone(),
                });
            }
        } else {
            headers = Some((current, path.as_path()));
        }

        for result in rdr.records() {
            let mut record = result?;
            record.push_field(city.as_str());
            rows.push(record);
        }
    }

    let mut out_headers = headers.map(|(h, _)| h).unwrap_or_default();
    out_headers.push_field(CITY_COLUMN);
    write_table(output.as_ref(), &out_headers, &rows)?;

    info!(rows = rows.len(), output = %output.as_ref().display(), "City tables combined");
    Ok(rows.len())
}
