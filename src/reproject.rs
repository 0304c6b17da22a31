//! Reprojection of point tables from degrees to Web Mercator meters.

use csv::StringRecord;
use geo::Point;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::datasets::{Dataset, meters_path};
use crate::error::{Error, Result};
use crate::output::write_table;
use crate::project::to_web_mercator;
use crate::stations::parse_coordinate;

/// Header names treated as a positional index column and dropped on read.
const INDEX_COLUMNS: &[&str] = &["", "Unnamed: 0"];
const GEOMETRY_COLUMN: &str = "geometry";

#[derive(Debug, Clone, PartialEq)]
pub struct ReprojectSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rows: usize,
}

/// Reprojects one of the configured datasets under `data_dir`, writing the
/// result next to the input with a `_meters` stem suffix.
pub fn reproject_dataset(dataset: Dataset, data_dir: impl AsRef<Path>) -> Result<ReprojectSummary> {
    let config = dataset.config();
    let input = dataset.input_path(data_dir);
    let output = meters_path(&input);
    reproject_table(&input, &output, config.lon_column, config.lat_column)
}

/// Reads `input`, appends projected `x`/`y` columns and writes `output`.
///
/// All original columns are kept except unnamed index columns and any
/// `geometry` column. Existing `x`/`y` columns are overwritten in place.
/// Nothing is written unless every row projects.
///
/// # Errors
///
/// [`Error::MissingColumn`] if either coordinate column is absent,
/// [`Error::MalformedCoordinate`] naming the first row whose longitude or
/// latitude is not a number, [`Error::CoordinateOutOfRange`] for values
/// the projection cannot represent.
#[tracing::instrument(skip_all, fields(input = %input.as_ref().display(), lon_column = %lon_column, lat_column = %lat_column))]
pub fn reproject_table(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    lon_column: &str,
    lat_column: &str,
) -> Result<ReprojectSummary> {
    let input = input.as_ref();
    let output = output.as_ref();

    let mut rdr = csv::Reader::from_reader(File::open(input)?);
    let source_headers = rdr.headers()?.clone();

    let keep: Vec<usize> = source_headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !INDEX_COLUMNS.contains(h) && *h != GEOMETRY_COLUMN)
        .map(|(i, _)| i)
        .collect();
    let mut headers: StringRecord = keep.iter().map(|&i| &source_headers[i]).collect();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::MissingColumn {
                path: input.to_path_buf(),
                column: name.to_string(),
            })
    };
    let lon_idx = column(lon_column)?;
    let lat_idx = column(lat_column)?;

    let x_idx = headers.iter().position(|h| h == "x");
    let y_idx = headers.iter().position(|h| h == "y");
    if x_idx.is_none() {
        headers.push_field("x");
    }
    if y_idx.is_none() {
        headers.push_field("y");
    }

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let row = i + 1;
        let mut fields: Vec<String> = keep
            .iter()
            .map(|&c| record.get(c).unwrap_or("").to_string())
            .collect();

        let lon = parse_coordinate(input, row, lon_column, &fields[lon_idx])?;
        let lat = parse_coordinate(input, row, lat_column, &fields[lat_idx])?;
        let projected = to_web_mercator(Point::new(lon, lat))?;

        set_or_push(&mut fields, x_idx, projected.x().to_string());
        set_or_push(&mut fields, y_idx, projected.y().to_string());
        rows.push(StringRecord::from(fields));
    }

    write_table(output, &headers, &rows)?;
    info!(rows = rows.len(), output = %output.display(), "Table reprojected");

    Ok(ReprojectSummary {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        rows: rows.len(),
    })
}

fn set_or_push(fields: &mut Vec<String>, idx: Option<usize>, value: String) {
    match idx {
        Some(i) => fields[i] = value,
        None => fields.push(value),
    }
}
