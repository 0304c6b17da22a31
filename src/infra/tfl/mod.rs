//! Transport for London unified API.

mod client;

pub use client::TflClient;
