use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tracing::debug;

use super::index::StationIndex;
use crate::error::{Error, Result};
use crate::stations::parse_coordinate;

pub const MIN_DISTANCE: u32 = 100;
pub const MAX_DISTANCE: u32 = 3000;
pub const DISTANCE_STEP: u32 = 100;

/// One row of a reprojected population table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationPoint {
    pub population: f64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PropRow {
    pub max_dist: u32,
    pub prop: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StationsWithinRow {
    pub max_dist: u32,
    pub n_stations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuadrantRow {
    pub population: f64,
    pub n_stations: usize,
}

/// `100, 200, ..., 3000` meters.
pub fn distance_thresholds() -> Vec<u32> {
    (MIN_DISTANCE..=MAX_DISTANCE)
        .step_by(DISTANCE_STEP as usize)
        .collect()
}

/// Reads a reprojected population table. The population column is the
/// first header containing `pop`, ignoring case (`Population`,
/// `population_2020`, ...).
pub fn read_population_points(path: impl AsRef<Path>) -> Result<Vec<PopulationPoint>> {
    let path = path.as_ref();
    let mut rdr = csv::Reader::from_reader(File::open(path)?);
    let headers = rdr.headers()?.clone();

    let missing = |column: &str| Error::MissingColumn {
        path: path.to_path_buf(),
        column: column.to_string(),
    };
    let pop_idx = headers
        .iter()
        .position(|h| h.to_ascii_lowercase().contains("pop"))
        .ok_or_else(|| missing("population"))?;
    let x_idx = headers.iter().position(|h| h == "x").ok_or_else(|| missing("x"))?;
    let y_idx = headers.iter().position(|h| h == "y").ok_or_else(|| missing("y"))?;
    let pop_column = &headers[pop_idx];

    let mut points = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let row = i + 1;
        let field = |idx: usize| record.get(idx).unwrap_or("");
        points.push(PopulationPoint {
            population: parse_coordinate(path, row, pop_column, field(pop_idx))?,
            x: parse_coordinate(path, row, "x", field(x_idx))?,
            y: parse_coordinate(path, row, "y", field(y_idx))?,
        });
    }
    debug!(path = %path.display(), points = points.len(), "Population points loaded");
    Ok(points)
}

/// Share of the total population whose nearest station lies within each
/// threshold. A point exactly at the threshold counts as covered. When the
/// total population is zero every share is zero.
pub fn population_props(index: &StationIndex, points: &[PopulationPoint], thresholds: &[u32]) -> Vec<PropRow> {
    let total: f64 = points.iter().map(|p| p.population).sum();
    let nearest: Vec<Option<f64>> = points
        .iter()
        .map(|p| index.nearest_distance(p.x, p.y))
        .collect();

    thresholds
        .iter()
        .map(|&max_dist| {
            let limit = f64::from(max_dist);
            let covered: f64 = points
                .iter()
                .zip(&nearest)
                .filter(|(_, d)| d.is_some_and(|d| d <= limit))
                .map(|(p, _)| p.population)
                .sum();
            let prop = if total > 0.0 { covered / total } else { 0.0 };
            PropRow { max_dist, prop }
        })
        .collect()
}

/// Station count around every population point, for every threshold.
/// Rows are grouped by threshold and keep the order of `points`.
pub fn stations_within(index: &StationIndex, points: &[PopulationPoint], thresholds: &[u32]) -> Vec<StationsWithinRow> {
    thresholds
        .iter()
        .flat_map(|&max_dist| {
            points.iter().map(move |p| StationsWithinRow {
                max_dist,
                n_stations: index.count_within(p.x, p.y, f64::from(max_dist)),
            })
        })
        .collect()
}

/// Population of every point next to the number of stations within
/// `max_dist` meters of it.
pub fn quadrant_rows(index: &StationIndex, points: &[PopulationPoint], max_dist: f64) -> Vec<QuadrantRow> {
    points
        .iter()
        .map(|p| QuadrantRow {
            population: p.population,
            n_stations: index.count_within(p.x, p.y, max_dist),
        })
        .collect()
}

/// Position of a population point relative to the upper quartiles of
/// population and of nearby station count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    /// Population at or below Q3, station count above Q3.
    Red,
    /// Population above Q3, station count at or below Q3.
    Orange,
    /// Both above Q3.
    Blue,
    /// Both at or below Q3.
    Green,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [Quadrant::Red, Quadrant::Orange, Quadrant::Blue, Quadrant::Green];

    pub fn classify(population: f64, n_stations: f64, population_q3: f64, n_stations_q3: f64) -> Self {
        match (population > population_q3, n_stations > n_stations_q3) {
            (false, true) => Quadrant::Red,
            (true, false) => Quadrant::Orange,
            (true, true) => Quadrant::Blue,
            (false, false) => Quadrant::Green,
        }
    }

    /// Table name of the coordinate file for this quadrant (`reds`, ...).
    pub fn table(self) -> &'static str {
        match self {
            Quadrant::Red => "reds",
            Quadrant::Orange => "oranges",
            Quadrant::Blue => "blues",
            Quadrant::Green => "greens",
        }
    }
}

/// Third quartile with linear interpolation between closest ranks.
/// Returns 0.0 for empty input.
pub fn upper_quartile(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = 0.75 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (rank - lower as f64)
}

/// Splits `points` into quadrants using the Q3 of population and of
/// `rows[i].n_stations`. `rows` must be the [`quadrant_rows`] of `points`.
pub fn classify_points(points: &[PopulationPoint], rows: &[QuadrantRow]) -> Vec<(Quadrant, PopulationPoint)> {
    let populations: Vec<f64> = rows.iter().map(|r| r.population).collect();
    let counts: Vec<f64> = rows.iter().map(|r| r.n_stations as f64).collect();
    let population_q3 = upper_quartile(&populations);
    let n_stations_q3 = upper_quartile(&counts);
    debug!(population_q3, n_stations_q3, "Quadrant thresholds");

    points
        .iter()
        .zip(rows)
        .map(|(p, r)| {
            let q = Quadrant::classify(r.population, r.n_stations as f64, population_q3, n_stations_q3);
            (q, *p)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(population: f64, x: f64, y: f64) -> PopulationPoint {
        PopulationPoint { population, x, y }
    }

    #[test]
    fn test_distance_thresholds() {
        let t = distance_thresholds();
        assert_eq!(t.len(), 30);
        assert_eq!(t.first(), Some(&100));
        assert_eq!(t.last(), Some(&3000));
    }

    #[test]
    fn test_population_props_accumulate() {
        let index = StationIndex::new(vec![[0.0, 0.0]]);
        let points = vec![
            point(25.0, 0.0, 0.0),
            point(25.0, 60.0, 80.0),   // 100 m
            point(25.0, 300.0, 400.0), // 500 m
            point(25.0, 1000.0, 1000.0),
        ];

        let rows = population_props(&index, &points, &[50, 100, 500, 1000, 1500]);

        let props: Vec<f64> = rows.iter().map(|r| r.prop).collect();
        assert_eq!(props, vec![0.25, 0.5, 0.75, 0.75, 1.0]);
        assert_eq!(rows[1].max_dist, 100);
    }

    #[test]
    fn test_population_props_weighted_by_population() {
        let index = StationIndex::new(vec![[0.0, 0.0], [5000.0, 0.0]]);
        let points = vec![point(90.0, 4900.0, 0.0), point(10.0, 2500.0, 0.0)];

        let rows = population_props(&index, &points, &[100, 3000]);

        assert_eq!(rows[0].prop, 0.9);
        assert_eq!(rows[1].prop, 1.0);
    }

    #[test]
    fn test_population_props_without_population() {
        let index = StationIndex::new(vec![[0.0, 0.0]]);

        let rows = population_props(&index, &[], &[100]);
        assert_eq!(rows, vec![PropRow { max_dist: 100, prop: 0.0 }]);

        let empty = StationIndex::new(Vec::new());
        let rows = population_props(&empty, &[point(10.0, 0.0, 0.0)], &[3000]);
        assert_eq!(rows[0].prop, 0.0);
    }

    #[test]
    fn test_stations_within_one_row_per_point_and_threshold() {
        let index = StationIndex::new(vec![[0.0, 0.0], [10.0, 20.0], [1100.0, 1100.0]]);
        let points = vec![point(1.0, 0.0, 0.0), point(1.0, 1000.0, 1000.0)];

        let rows = stations_within(&index, &points, &[50, 1600]);

        let counts: Vec<(u32, usize)> = rows.iter().map(|r| (r.max_dist, r.n_stations)).collect();
        assert_eq!(counts, vec![(50, 2), (50, 0), (1600, 3), (1600, 3)]);
    }

    #[test]
    fn test_upper_quartile_interpolates() {
        assert_eq!(upper_quartile(&[]), 0.0);
        assert_eq!(upper_quartile(&[7.0]), 7.0);
        assert_eq!(upper_quartile(&[4.0, 1.0, 3.0, 2.0, 5.0]), 4.0);
        assert_eq!(upper_quartile(&[1.0, 2.0, 3.0, 4.0]), 3.25);
    }

    #[test]
    fn test_classify_boundaries_fall_low() {
        assert_eq!(Quadrant::classify(10.0, 5.0, 10.0, 2.0), Quadrant::Red);
        assert_eq!(Quadrant::classify(11.0, 2.0, 10.0, 2.0), Quadrant::Orange);
        assert_eq!(Quadrant::classify(11.0, 3.0, 10.0, 2.0), Quadrant::Blue);
        assert_eq!(Quadrant::classify(10.0, 2.0, 10.0, 2.0), Quadrant::Green);
    }

    #[test]
    fn test_classify_points() {
        let index = StationIndex::new(vec![[0.0, 0.0], [10.0, 0.0], [20.0, 0.0]]);
        let points = vec![
            point(1.0, 0.0, 0.0),        // 3 stations, small population
            point(2.0, 5000.0, 0.0),     // none
            point(3.0, 6000.0, 0.0),     // none
            point(100.0, 7000.0, 0.0),   // none, large population
            point(100.0, 10.0, 0.0),     // 3 stations, large population
        ];

        let rows = quadrant_rows(&index, &points, 500.0);
        let classes: Vec<Quadrant> = classify_points(&points, &rows).into_iter().map(|(q, _)| q).collect();

        // population Q3 = 100, count Q3 = 3: nothing lies strictly above either
        assert!(classes.iter().all(|q| *q == Quadrant::Green));

        let rows = quadrant_rows(&index, &points[..4], 500.0);
        let classes: Vec<Quadrant> = classify_points(&points[..4], &rows).into_iter().map(|(q, _)| q).collect();
        assert_eq!(
            classes,
            vec![Quadrant::Red, Quadrant::Green, Quadrant::Green, Quadrant::Orange]
        );
    }

    #[test]
    fn test_read_population_points() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokyo_pp_meters.csv");
        std::fs::write(
            &path,
            "longitude,latitude,population_2020,x,y\n139.69,35.69,812.5,15549000.0,4258000.0\n",
        )
        .unwrap();

        let points = read_population_points(&path).unwrap();

        assert_eq!(points, vec![point(812.5, 15_549_000.0, 4_258_000.0)]);
    }

    #[test]
    fn test_read_population_points_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("london_pp_meters.csv");
        std::fs::write(&path, "Lat,Lon,Population,x,y\n51.5,-0.1,12,1,2\n51.5,-0.1,NaN?,1,2\n").unwrap();

        let err = read_population_points(&path).unwrap_err();
        match err {
            Error::MalformedCoordinate { row, column, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "Population");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_population_points_needs_population() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pp_meters.csv");
        std::fs::write(&path, "Lat,Lon,x,y\n51.5,-0.1,1,2\n").unwrap();

        let err = read_population_points(&path).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { ref column, .. } if column == "population"));
    }
}
