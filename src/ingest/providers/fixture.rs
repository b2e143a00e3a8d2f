use anyhow::Result;
use async_trait::async_trait;

use crate::ingest::types::PageSource;

/// Serves a document held in memory; used by tests and offline re-renders.
pub struct FixturePageSource {
    html: String,
}

impl FixturePageSource {
    pub fn from_fixture(s: &'static str) -> Self {
        Self { html: s.to_string() }
    }

    pub fn from_fixture_str(s: &str) -> Self {
        Self { html: s.to_string() }
    }
}

#[async_trait]
impl PageSource for FixturePageSource {
    async fn fetch_page(&self) -> Result<String> {
        Ok(self.html.clone())
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
