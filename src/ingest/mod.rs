// src/ingest/mod.rs
pub mod extract;
pub mod providers;
pub mod types;

use anyhow::{Context, Result};

use crate::ingest::types::{ExtractedPage, PageSource};

/// Fetch one document from `source` and extract it.
/// Returns the raw document as well, so callers can keep a copy of what was parsed.
pub async fn fetch_and_extract(source: &dyn PageSource) -> Result<(String, ExtractedPage)> {
    let html = source
        .fetch_page()
        .await
        .with_context(|| format!("fetching page from {} source", source.name()))?;
    let page = extract::extract_page(&html).context("extracting event table")?;
    tracing::info!(
        target: "ingest",
        source = source.name(),
        events = page.events.len(),
        last_updated = %page.last_updated,
        "page ingested"
    );
    Ok((html, page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::providers::fixture::FixturePageSource;

    #[tokio::test]
    async fn fixture_source_feeds_extractor() {
        let src = FixturePageSource::from_fixture_str("<html><body><p>nothing here</p></body></html>");
        let err = fetch_and_extract(&src).await.unwrap_err();
        assert!(format!("{err:#}").contains("extracting event table"));
    }
}
