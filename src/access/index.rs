use rstar::{PointDistance, RTree};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};

/// Projected position of one row of a `_meters` table.
#[derive(Debug, Deserialize)]
struct ProjectedPoint {
    x: f64,
    y: f64,
}

/// Stations in Web Mercator meters, bulk loaded into an R*-tree.
pub struct StationIndex {
    tree: RTree<[f64; 2]>,
}

impl StationIndex {
    pub fn new(points: Vec<[f64; 2]>) -> Self {
        Self {
            tree: RTree::bulk_load(points),
        }
    }

    /// Loads the `x`/`y` columns of a reprojected station table. Other
    /// columns are ignored.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut rdr = csv::Reader::from_reader(File::open(path)?);
        let headers = rdr.headers()?.clone();
        for column in ["x", "y"] {
            if !headers.iter().any(|h| h == column) {
                return Err(Error::MissingColumn {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                });
            }
        }

        let mut points = Vec::new();
        for result in rdr.deserialize::<ProjectedPoint>() {
            let p = result?;
            points.push([p.x, p.y]);
        }
        debug!(path = %path.display(), stations = points.len(), "Station index loaded");
        Ok(Self::new(points))
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distance in meters from `(x, y)` to the closest station, `None` when
    /// the index is empty.
    pub fn nearest_distance(&self, x: f64, y: f64) -> Option<f64> {
        let query = [x, y];
        self.tree
            .nearest_neighbor(&query)
            .map(|station| station.distance_2(&query).sqrt())
    }

    /// Number of stations no further than `max_dist` meters from `(x, y)`.
    pub fn count_within(&self, x: f64, y: f64, max_dist: f64) -> usize {
        self.tree
            .locate_within_distance([x, y], max_dist * max_dist)
            .count()
    }
}
