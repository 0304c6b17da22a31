mod basic;
mod client;
mod no_cache;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use no_cache::NoCache;

use crate::error::{Error, Result};
use tracing::debug;

/// Issues a GET for `url` and returns the body.
///
/// # Errors
///
/// [`Error::InvalidUrl`] if `url` does not parse, [`Error::Transport`] on
/// connection failures and [`Error::Http`] for any non-success status.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let parsed = url
        .parse::<reqwest::Url>()
        .map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(Error::Http {
            url: url.to_string(),
            status,
        });
    }

    let bytes = resp.bytes().await?;
    debug!(url, bytes = bytes.len(), "Response received");
    Ok(bytes.to_vec())
}
