//! Per-line station list ingestion.

use std::path::{Path, PathBuf};
use tracing::{Instrument, error, info};

use crate::error::{Error, Result};
use crate::services::stop_points::StopPointSource;
use crate::stations::{line_csv_path, write_line_csv};

/// What to do when one line cannot be fetched or written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failing line and return its error.
    #[default]
    Abort,
    /// Log the failure, remember the line and move on to the next one.
    Continue,
}

/// Outcome of an ingestion run.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(String, Error)>,
}

impl IngestReport {
    /// True when every requested line produced a file. Aggregation must only
    /// run after a complete ingestion.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Fetches the stop points of every line in `line_ids`, one at a time and in
/// order, writing `<out_dir>/<line_id>.csv` for each.
///
/// Identifiers are not deduplicated; a repeated line is fetched again and
/// its file rewritten.
///
/// # Errors
///
/// [`Error::EmptyLineList`] before any request or directory creation when
/// `line_ids` is empty.
#[tracing::instrument(skip_all, fields(lines = line_ids.len(), out_dir = %out_dir.as_ref().display()))]
pub async fn ingest_lines<S: StopPointSource + ?Sized>(
    source: &S,
    line_ids: &[String],
    out_dir: impl AsRef<Path>,
    policy: FailurePolicy,
) -> Result<IngestReport> {
    if line_ids.is_empty() {
        return Err(Error::EmptyLineList);
    }
    let out_dir = out_dir.as_ref();
    std::fs::create_dir_all(out_dir)?;

    let mut report = IngestReport::default();

    for line_id in line_ids {
        let span = tracing::info_span!("ingest_line", line_id = %line_id);
        let result = ingest_line(source, line_id, out_dir).instrument(span).await;

        match result {
            Ok(path) => report.written.push(path),
            Err(e) if policy == FailurePolicy::Continue => {
                error!(line_id = %line_id, error = %e, "Line ingestion failed, continuing");
                report.failed.push((line_id.clone(), e));
            }
            Err(e) => {
                error!(line_id = %line_id, error = %e, "Line ingestion failed, aborting");
                return Err(e);
            }
        }
    }

    info!(
        written = report.written.len(),
        failed = report.failed.len(),
        "Ingestion finished"
    );
    Ok(report)
}

async fn ingest_line<S: StopPointSource + ?Sized>(
    source: &S,
    line_id: &str,
    out_dir: &Path,
) -> Result<PathBuf> {
    let stations = source.stop_points(line_id).await?;
    let path = line_csv_path(out_dir, line_id);
    write_line_csv(&path, &stations)?;
    info!(stations = stations.len(), path = %path.display(), "Line stations written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stations::{StationRecord, read_line_csv};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Serves canned stations; lines named `broken*` fail.
    struct FakeSource {
        calls: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl StopPointSource for FakeSource {
        async fn stop_points(&self, line_id: &str) -> Result<Vec<StationRecord>> {
            self.calls.lock().unwrap().push(line_id.to_string());
            if line_id.starts_with("broken") {
                return Err(Error::InvalidUrl(line_id.to_string()));
            }
            Ok(vec![StationRecord {
                name: format!("{line_id} terminus"),
                lat: 51.5,
                lon: -0.1,
            }])
        }
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_ingest_writes_one_file_per_line_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::new();

        let report = ingest_lines(&source, &ids(&["central", "district"]), dir.path(), FailurePolicy::Abort)
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(*source.calls.lock().unwrap(), ids(&["central", "district"]));
        let stations = read_line_csv(dir.path().join("district.csv")).unwrap();
        assert_eq!(stations[0].name, "district terminus");
    }

    #[tokio::test]
    async fn test_ingest_abort_stops_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::new();

        let result = ingest_lines(
            &source,
            &ids(&["central", "broken", "district"]),
            dir.path(),
            FailurePolicy::Abort,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(*source.calls.lock().unwrap(), ids(&["central", "broken"]));
        assert!(!dir.path().join("district.csv").exists());
    }

    #[tokio::test]
    async fn test_ingest_continue_records_failures() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::new();

        let report = ingest_lines(
            &source,
            &ids(&["broken-a", "central", "broken-b"]),
            dir.path(),
            FailurePolicy::Continue,
        )
        .await
        .unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.written.len(), 1);
        let failed: Vec<_> = report.failed.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(failed, vec!["broken-a", "broken-b"]);
    }

    #[tokio::test]
    async fn test_ingest_rejects_empty_line_list() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("stoppoints by line");
        let source = FakeSource::new();

        let err = ingest_lines(&source, &[], &out_dir, FailurePolicy::Continue)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::EmptyLineList));
        assert!(source.calls.lock().unwrap().is_empty());
        assert!(!out_dir.exists());
    }
}
