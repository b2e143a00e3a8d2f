// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// One tournament row as published on the listing page.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct RawEvent {
    pub title: String,
    pub city: String,
    pub country: String, // two-letter code, e.g. "FR"
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub contact: String, // raw markup, may contain links
    pub url: Option<String>,
    pub source_fragment: String, // full <tr> markup, fingerprint input only
}

/// Everything the extractor pulls out of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub events: Vec<RawEvent>,
    pub last_updated: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self) -> Result<String>;
    fn name(&self) -> &'static str;
}
