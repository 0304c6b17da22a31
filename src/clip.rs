//! Clipping raw population points to a city boundary.

use csv::StringRecord;
use geo::{Contains, Geometry, MultiPolygon, Point, Polygon};
use geojson::GeoJson;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Error, Result};
use crate::output::write_table;
use crate::stations::parse_coordinate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipSummary {
    pub output: PathBuf,
    pub kept: usize,
    pub dropped: usize,
}

/// Loads every polygon of a GeoJSON document (geometry, feature or feature
/// collection) as one multipolygon. Non-areal geometries are ignored.
///
/// # Errors
///
/// [`Error::GeoJson`] if the file is not GeoJSON, [`Error::EmptyBoundary`]
/// if it holds no polygon.
pub fn load_boundary(path: impl AsRef<Path>) -> Result<MultiPolygon<f64>> {
    let path = path.as_ref();
    let geojson: GeoJson = std::fs::read_to_string(path)?.parse()?;
    let geometry = Geometry::<f64>::try_from(geojson)?;

    let mut polygons = Vec::new();
    collect_polygons(geometry, &mut polygons);
    if polygons.is_empty() {
        return Err(Error::EmptyBoundary(path.to_path_buf()));
    }
    Ok(MultiPolygon::new(polygons))
}

fn collect_polygons(geometry: Geometry<f64>, out: &mut Vec<Polygon<f64>>) {
    match geometry {
        Geometry::Polygon(p) => out.push(p),
        Geometry::MultiPolygon(mp) => out.extend(mp),
        Geometry::GeometryCollection(gc) => {
            for g in gc {
                collect_polygons(g, out);
            }
        }
        _ => {}
    }
}

/// Copies the rows of `input` whose point lies strictly inside `boundary`
/// to `output`, keeping every column as is. Points on the boundary line are
/// dropped.
#[tracing::instrument(skip_all, fields(input = %input.as_ref().display()))]
pub fn clip_table(
    boundary: &MultiPolygon<f64>,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    lon_column: &str,
    lat_column: &str,
) -> Result<ClipSummary> {
    let input = input.as_ref();
    let output = output.as_ref();

    let mut rdr = csv::Reader::from_reader(File::open(input)?);
    let headers = rdr.headers()?.clone();
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

    let mut kept: Vec<StringRecord> = Vec::new();
    let mut dropped = 0;
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let row = i + 1;
        let lon = parse_coordinate(input, row, lon_column, record.get(lon_idx).unwrap_or(""))?;
        let lat = parse_coordinate(input, row, lat_column, record.get(lat_idx).unwrap_or(""))?;

        if boundary.contains(&Point::new(lon, lat)) {
            kept.push(record);
        } else {
            dropped += 1;
        }
    }

    write_table(output, &headers, &kept)?;
    info!(kept = kept.len(), dropped, output = %output.display(), "Points clipped");

    Ok(ClipSummary {
        output: output.to_path_buf(),
        kept: kept.len(),
        dropped,
    })
}
