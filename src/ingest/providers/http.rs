use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use reqwest::Client;
use std::time::Duration;

use crate::ingest::types::PageSource;

pub struct HttpPageSource {
    url: String,
    client: Client,
    timeout: Duration,
}

impl HttpPageSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: Client::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self) -> Result<String> {
        let resp = match self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(error = ?e, url = %self.url, "page fetch failed");
                counter!("fetch_errors_total").increment(1);
                return Err(e).with_context(|| format!("GET {}", self.url));
            }
        };
        let resp = resp
            .error_for_status()
            .with_context(|| format!("GET {} returned non-2xx", self.url))?;
        let body = resp.text().await.context("reading page body")?;
        tracing::debug!(target: "ingest", bytes = body.len(), url = %self.url, "page fetched");
        Ok(body)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_url_and_timeout() {
        let src = HttpPageSource::new("https://example.org/calendar/").with_timeout(5);
        assert_eq!(src.url(), "https://example.org/calendar/");
        assert_eq!(src.timeout, Duration::from_secs(5));
        assert_eq!(src.name(), "http");
    }
}
