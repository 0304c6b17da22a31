use async_trait::async_trait;
use tracing::debug;

use crate::error::{Error, Result};
use crate::fetch::{BasicClient, HttpClient, NoCache, fetch_bytes};
use crate::services::stop_points::StopPointSource;
use crate::stations::{StationRecord, parse_stop_points};

/// Fetches `/Line/{line_id}/StopPoints` from the TfL API.
///
/// No credentials are sent; every request carries `Cache-Control: no-cache`.
pub struct TflClient<C> {
    base_url: reqwest::Url,
    http: NoCache<C>,
}

impl TflClient<BasicClient> {
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::with_client(base_url, BasicClient::new()?)
    }
}

impl<C: HttpClient> TflClient<C> {
    /// # Errors
    ///
    /// [`Error::InvalidUrl`] if `base_url` is not an absolute http(s) URL.
    pub fn with_client(base_url: impl AsRef<str>, http: C) -> Result<Self> {
        let raw = base_url.as_ref();
        let base_url = reqwest::Url::parse(raw).map_err(|e| Error::InvalidUrl(format!("{raw}: {e}")))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(raw.to_string()));
        }
        Ok(Self {
            base_url,
            http: NoCache::new(http),
        })
    }

    /// The stop point URL for `line_id`. The id is percent-encoded as a
    /// single path segment, so it can never add a query or fragment.
    pub fn stop_points_url(&self, line_id: &str) -> Result<reqwest::Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["Line", line_id, "StopPoints"]);
        Ok(url)
    }
}

#[async_trait]
impl<C: HttpClient> StopPointSource for TflClient<C> {
    async fn stop_points(&self, line_id: &str) -> Result<Vec<StationRecord>> {
        let url = self.stop_points_url(line_id)?;
        let body = fetch_bytes(&self.http, url.as_str()).await?;
        let stations = parse_stop_points(&body)?;
        debug!(line_id, stations = stations.len(), "Stop points decoded");
        Ok(stations)
    }
}
