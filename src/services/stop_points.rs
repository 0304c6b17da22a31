//! Trait for sources of per-line station lists.

use async_trait::async_trait;

use crate::error::Result;
use crate::stations::StationRecord;

/// Abstraction over a transit API that lists the stop points of a line.
#[async_trait]
pub trait StopPointSource: Send + Sync {
    /// Returns the stations served by `line_id`, in the order the source
    /// lists them.
    async fn stop_points(&self, line_id: &str) -> Result<Vec<StationRecord>>;
}
