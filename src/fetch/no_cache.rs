use super::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, HeaderValue};

/// An [`HttpClient`] wrapper that asks every intermediary for a fresh
/// response by sending `Cache-Control: no-cache`.
pub struct NoCache<C> {
    pub inner: C,
}

impl<C> NoCache<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for NoCache<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        self.inner.execute(req).await
    }
}
