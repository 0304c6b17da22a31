//! Station records and the per-line CSV files that hold them.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::output::write_records;

/// A named station with WGS84 coordinates in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    #[serde(rename = "station_name")]
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// One element of the transit API's stop point array. Only the fields the
/// pipeline needs are decoded.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopPoint {
    pub common_name: String,
    pub lat: f64,
    pub lon: f64,
}

impl From<StopPoint> for StationRecord {
    fn from(sp: StopPoint) -> Self {
        StationRecord {
            name: sp.common_name,
            lat: sp.lat,
            lon: sp.lon,
        }
    }
}

/// Row layout of a per-line CSV file.
#[derive(Serialize)]
struct LineRow<'a> {
    #[serde(rename = "commonName")]
    common_name: &'a str,
    lat: f64,
    lon: f64,
}

/// Decodes a stop point JSON array into station records, in API order.
pub fn parse_stop_points(bytes: &[u8]) -> Result<Vec<StationRecord>> {
    let points: Vec<StopPoint> = serde_json::from_slice(bytes)?;
    Ok(points.into_iter().map(StationRecord::from).collect())
}

/// Location of the CSV file for `line_id` inside `dir`.
pub fn line_csv_path(dir: impl AsRef<Path>, line_id: &str) -> PathBuf {
    dir.as_ref().join(format!("{line_id}.csv"))
}

/// Writes one line's stations with the header `commonName,lat,lon`.
pub fn write_line_csv(path: impl AsRef<Path>, stations: &[StationRecord]) -> Result<()> {
    let rows = stations.iter().map(|s| LineRow {
        common_name: &s.name,
        lat: s.lat,
        lon: s.lon,
    });
    write_records(path, &["commonName", "lat", "lon"], rows)?;
    Ok(())
}

const NAME_COLUMNS: &[&str] = &["commonName", "station_name", "0"];
const LAT_COLUMNS: &[&str] = &["lat", "1"];
const LON_COLUMNS: &[&str] = &["lon", "2"];

/// Reads a per-line CSV file.
///
/// Columns are located by header name, so a leading index column (as
/// written by dataframe tools) is skipped. Files whose header is the bare
/// positional `,0,1,2` form are accepted too.
pub fn read_line_csv(path: impl AsRef<Path>) -> Result<Vec<StationRecord>> {
    let path = path.as_ref();
    let mut rdr = csv::Reader::from_reader(File::open(path)?);
    let headers = rdr.headers()?.clone();

    let find = |candidates: &[&str]| {
        candidates
            .iter()
            .find_map(|c| headers.iter().position(|h| h == *c))
            .ok_or_else(|| Error::MissingColumn {
                path: path.to_path_buf(),
                column: candidates[0].to_string(),
            })
    };
    let name_idx = find(NAME_COLUMNS)?;
    let lat_idx = find(LAT_COLUMNS)?;
    let lon_idx = find(LON_COLUMNS)?;

    let mut stations = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let row = i + 1;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        stations.push(StationRecord {
            name: field(name_idx).to_string(),
            lat: parse_coordinate(path, row, &headers[lat_idx], field(lat_idx))?,
            lon: parse_coordinate(path, row, &headers[lon_idx], field(lon_idx))?,
        });
    }

    debug!(path = %path.display(), rows = stations.len(), "Line CSV read");
    Ok(stations)
}

/// Parses a coordinate cell, failing with the row and column on bad input.
pub(crate) fn parse_coordinate(path: &Path, row: usize, column: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::MalformedCoordinate {
            path: path.to_path_buf(),
            row,
            column: column.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const STOP_POINTS: &str = r#"[
        {"$type": "Tfl.Api.Presentation.Entities.StopPoint", "naptanId": "940GZZLUBST",
         "commonName": "Baker Street Underground Station", "lat": 51.522883, "lon": -0.15713},
        {"commonName": "Oxford Circus Underground Station", "lat": 51.515224, "lon": -0.141903,
         "modes": ["tube"]}
    ]"#;

    #[test]
    fn test_parse_stop_points() {
        let stations = parse_stop_points(STOP_POINTS.as_bytes()).unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].name, "Baker Street Underground Station");
        assert_eq!(stations[0].lat, 51.522883);
        assert_eq!(stations[1].lon, -0.141903);
    }

    #[test]
    fn test_parse_stop_points_missing_field() {
        let err = parse_stop_points(br#"[{"commonName": "Bank", "lat": 51.5}]"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_parse_stop_points_not_json() {
        assert!(parse_stop_points(b"<html>").is_err());
    }

    #[test]
    fn test_line_csv_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = line_csv_path(dir.path(), "bakerloo");
        let stations = parse_stop_points(STOP_POINTS.as_bytes()).unwrap();

        write_line_csv(&path, &stations).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("commonName,lat,lon\n"));
        assert_eq!(read_line_csv(&path).unwrap(), stations);
    }

    #[test]
    fn test_read_legacy_indexed_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("central.csv");
        std::fs::write(
            &path,
            ",0,1,2\n0,Bank Underground Station,51.513356,-0.088899\n1,Liverpool Street,51.517372,-0.083182\n",
        )
        .unwrap();

        let stations = read_line_csv(&path).unwrap();
        assert_eq!(
            stations[0],
            StationRecord {
                name: "Bank Underground Station".to_string(),
                lat: 51.513356,
                lon: -0.088899,
            }
        );
        assert_eq!(stations.len(), 2);
    }

    #[test]
    fn test_read_malformed_latitude() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dlr.csv");
        std::fs::write(&path, "commonName,lat,lon\nBank,north,-0.08\n").unwrap();

        match read_line_csv(&path).unwrap_err() {
            Error::MalformedCoordinate { row, column, .. } => {
                assert_eq!(row, 1);
                assert_eq!(column, "lat");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tram.csv");
        std::fs::write(&path, "commonName,lat\nWimbledon,51.42\n").unwrap();

        assert!(matches!(
            read_line_csv(&path).unwrap_err(),
            Error::MissingColumn { .. }
        ));
    }
}
