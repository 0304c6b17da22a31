pub mod access;
pub mod aggregate;
pub mod clip;
pub mod combine;
pub mod config;
pub mod datasets;
pub mod error;
pub mod fetch;
pub mod infra;
pub mod ingest;
pub mod lines;
pub mod output;
pub mod pipeline;
pub mod project;
pub mod reproject;
pub mod services;
pub mod stations;

pub use error::{Error, Result};
