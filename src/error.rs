//! Error types shared by every pipeline stage.
//!
//! Variants fall into three groups: configuration problems (reported before
//! any I/O), transport failures while talking to the transit API, and
//! malformed input. None of them are retried.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown dataset '{name}' (expected one of: {})", known.join(", "))]
    UnknownDataset {
        name: String,
        known: Vec<&'static str>,
    },
    #[error("unknown city '{0}' (expected london or tokyo)")]
    UnknownCity(String),
    #[error("line identifier list is empty")]
    EmptyLineList,
    #[error("invalid line identifier {0:?}")]
    InvalidLineId(String),
    #[error("no station file for line '{line_id}' at {}", path.display())]
    MissingLineFile { line_id: String, path: PathBuf },
    #[error("column mismatch between {} and {}", left.display(), right.display())]
    MismatchedColumns { left: PathBuf, right: PathBuf },

    #[error("request to {url} failed with status {status}")]
    Http {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{}: missing column '{column}'", path.display())]
    MissingColumn { path: PathBuf, column: String },
    #[error("{}: row {row}: column '{column}' is not a number: {value:?}", path.display())]
    MalformedCoordinate {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },
    #[error("coordinate out of range: lon={lon}, lat={lat}")]
    CoordinateOutOfRange { lon: f64, lat: f64 },
    #[error("malformed GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),
    #[error("{}: boundary holds no polygon", .0.display())]
    EmptyBoundary(PathBuf),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors caused by bad arguments or inputs that disagree with
    /// each other, as opposed to transport or data failures.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::UnknownDataset { .. }
                | Error::UnknownCity(_)
                | Error::EmptyLineList
                | Error::InvalidLineId(_)
                | Error::MissingLineFile { .. }
                | Error::MismatchedColumns { .. }
                | Error::EmptyBoundary(_)
        )
    }
}
