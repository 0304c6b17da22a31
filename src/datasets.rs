//! The fixed set of point datasets that can be reprojected, and the two
//! cities they belong to.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Suffix appended to the file stem of a reprojected table.
pub const METERS_SUFFIX: &str = "_meters";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    LondonTrains,
    TokyoTrains,
    LondonPp,
    TokyoPp,
}

/// Where a dataset lives and which columns hold its coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetConfig {
    pub id: &'static str,
    /// Relative to the data directory.
    pub path: &'static str,
    pub lon_column: &'static str,
    pub lat_column: &'static str,
}

static DATASETS: &[(Dataset, DatasetConfig)] = &[
    (
        Dataset::LondonTrains,
        DatasetConfig {
            id: "london_trains",
            path: "london_trains/stations/station_coords.csv",
            lon_column: "lon",
            lat_column: "lat",
        },
    ),
    (
        Dataset::TokyoTrains,
        DatasetConfig {
            id: "tokyo_trains",
            path: "tokyo_trains/coords.csv",
            lon_column: "lon",
            lat_column: "lat",
        },
    ),
    (
        Dataset::LondonPp,
        DatasetConfig {
            id: "london_pp",
            path: "london_pp.csv",
            lon_column: "Lon",
            lat_column: "Lat",
        },
    ),
    (
        Dataset::TokyoPp,
        DatasetConfig {
            id: "tokyo_pp",
            path: "tokyo_pp.csv",
            lon_column: "longitude",
            lat_column: "latitude",
        },
    ),
];

impl Dataset {
    pub fn all() -> impl Iterator<Item = Dataset> {
        DATASETS.iter().map(|(d, _)| *d)
    }

    pub fn ids() -> Vec<&'static str> {
        DATASETS.iter().map(|(_, c)| c.id).collect()
    }

    pub fn config(self) -> &'static DatasetConfig {
        // table rows follow declaration order
        &DATASETS[self as usize].1
    }

    pub fn id(self) -> &'static str {
        self.config().id
    }

    pub fn input_path(self, data_dir: impl AsRef<Path>) -> PathBuf {
        data_dir.as_ref().join(self.config().path)
    }
}

impl FromStr for Dataset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DATASETS
            .iter()
            .find(|(_, c)| c.id == s)
            .map(|(d, _)| *d)
            .ok_or_else(|| Error::UnknownDataset {
                name: s.to_string(),
                known: Self::ids(),
            })
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum City {
    London,
    Tokyo,
}

impl City {
    pub const ALL: [City; 2] = [City::London, City::Tokyo];

    pub fn as_str(self) -> &'static str {
        match self {
            City::London => "london",
            City::Tokyo => "tokyo",
        }
    }

    pub fn stations(self) -> Dataset {
        match self {
            City::London => Dataset::LondonTrains,
            City::Tokyo => Dataset::TokyoTrains,
        }
    }

    pub fn population(self) -> Dataset {
        match self {
            City::London => Dataset::LondonPp,
            City::Tokyo => Dataset::TokyoPp,
        }
    }

    /// Reprojected station table, as written by the `reproject` step.
    pub fn stations_meters_path(self, data_dir: impl AsRef<Path>) -> PathBuf {
        meters_path(self.stations().input_path(data_dir))
    }

    /// Reprojected population point table.
    pub fn population_meters_path(self, data_dir: impl AsRef<Path>) -> PathBuf {
        meters_path(self.population().input_path(data_dir))
    }
}

impl FromStr for City {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        City::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::UnknownCity(s.to_string()))
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `dir/name.ext` becomes `dir/name_meters.ext`.
pub fn meters_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}{METERS_SUFFIX}.{}", ext.to_string_lossy()),
        None => format!("{stem}{METERS_SUFFIX}"),
    };
    path.with_file_name(name)
}
