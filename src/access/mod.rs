//! Station access analyses over reprojected tables.
//!
//! Every analysis loads a city's `_meters` station table into an R*-tree and
//! queries it around each population point. Results land next to the other
//! city tables as `<city>_<table>.csv`, ready for [`crate::combine`].

mod analysis;
mod index;

pub use analysis::{
    DISTANCE_STEP, MAX_DISTANCE, MIN_DISTANCE, PopulationPoint, PropRow, Quadrant, QuadrantRow,
    StationsWithinRow, classify_points, distance_thresholds, population_props, quadrant_rows,
    read_population_points, stations_within, upper_quartile,
};
pub use index::StationIndex;

use std::path::{Path, PathBuf};
use tracing::info;

use crate::combine::city_table_path;
use crate::datasets::City;
use crate::error::Result;
use crate::output::write_records;

pub const PROPS_TABLE: &str = "props";
pub const STATIONS_WITHIN_TABLE: &str = "stations_within_pp";
pub const QUADRANT_TABLE: &str = "quadrant";

fn load_city(city: City, data_dir: &Path) -> Result<(StationIndex, Vec<PopulationPoint>)> {
    let index = StationIndex::load(city.stations_meters_path(data_dir))?;
    let points = read_population_points(city.population_meters_path(data_dir))?;
    info!(city = %city, stations = index.len(), points = points.len(), "City tables loaded");
    Ok((index, points))
}

/// Writes `<city>_props.csv` (`max_dist,prop`) for every distance
/// threshold.
#[tracing::instrument(skip(data_dir))]
pub fn run_props(city: City, data_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let data_dir = data_dir.as_ref();
    let (index, points) = load_city(city, data_dir)?;
    let rows = population_props(&index, &points, &distance_thresholds());

    let output = city_table_path(data_dir, city, PROPS_TABLE);
    write_records(&output, &["max_dist", "prop"], rows)?;
    info!(output = %output.display(), "Population shares written");
    Ok(output)
}

/// Writes `<city>_stations_within_pp.csv` (`max_dist,n_stations`), one row
/// per population point per threshold.
#[tracing::instrument(skip(data_dir))]
pub fn run_stations_within(city: City, data_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let data_dir = data_dir.as_ref();
    let (index, points) = load_city(city, data_dir)?;
    let rows = stations_within(&index, &points, &distance_thresholds());

    let output = city_table_path(data_dir, city, STATIONS_WITHIN_TABLE);
    let count = write_records(&output, &["max_dist", "n_stations"], rows)?;
    info!(rows = count, output = %output.display(), "Station counts written");
    Ok(output)
}

/// Writes `<city>_quadrant.csv` (`population,n_stations`) and one `x,y`
/// file per [`Quadrant`] (`<city>_reds.csv`, ...). Returns every path
/// written, the quadrant table first.
#[tracing::instrument(skip(data_dir))]
pub fn run_quadrants(city: City, data_dir: impl AsRef<Path>, max_dist: f64) -> Result<Vec<PathBuf>> {
    let data_dir = data_dir.as_ref();
    let (index, points) = load_city(city, data_dir)?;
    let rows = quadrant_rows(&index, &points, max_dist);
    let classified = classify_points(&points, &rows);

    let table = city_table_path(data_dir, city, QUADRANT_TABLE);
    write_records(&table, &["population", "n_stations"], &rows)?;
    let mut written = vec![table];

    for quadrant in Quadrant::ALL {
        let coords = classified
            .iter()
            .filter(|(q, _)| *q == quadrant)
            .map(|(_, p)| (p.x, p.y));
        let path = city_table_path(data_dir, city, quadrant.table());
        let count = write_records(&path, &["x", "y"], coords)?;
        info!(quadrant = ?quadrant, points = count, "Quadrant coordinates written");
        written.push(path);
    }
    Ok(written)
}
