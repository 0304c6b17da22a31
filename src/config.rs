//! Runtime settings and the on-disk data layout.
//!
//! Settings come from the environment (after `.env` has been loaded by the
//! binary). Every input and output path is derived from a single data
//! directory:
//!
//! ```text
//! data/
//!   london_trains/lines/line_ids.txt
//!   london_trains/stoppoints by line/<line_id>.csv
//!   london_trains/stations/station_coords.csv
//!   tokyo_trains/coords.csv
//!   london_pp.csv
//!   tokyo_pp.csv
//! ```

use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_API_BASE: &str = "https://api.tfl.gov.uk";

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub api_base: String,
}

impl Settings {
    /// Reads `TRANSIT_DATA_DIR` and `TFL_API_BASE`, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup("TRANSIT_DATA_DIR")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        let api_base = lookup("TFL_API_BASE")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Self {
            data_dir: PathBuf::from(data_dir),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn layout(&self) -> DataLayout {
        DataLayout::new(&self.data_dir)
    }
}

/// Paths of the London station pipeline relative to a data directory.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn line_ids_file(&self) -> PathBuf {
        self.root.join("london_trains").join("lines").join("line_ids.txt")
    }

    pub fn line_csv_dir(&self) -> PathBuf {
        self.root.join("london_trains").join("stoppoints by line")
    }

    pub fn station_coords_file(&self) -> PathBuf {
        self.root
            .join("london_trains")
            .join("stations")
            .join("station_coords.csv")
    }
}
