// src/pipeline.rs
//! One scheduled run, end to end.

use anyhow::{Context, Result};
use metrics::{counter, gauge};

use crate::config::Config;
use crate::ingest::{fetch_and_extract, types::PageSource};
use crate::render::{
    ical::{render_calendar, CalendarMeta},
    rss::{render_feed, FeedMeta},
    write_atomic,
};
use crate::snapshot::SnapshotStore;
use crate::tracker::{enrich, Change};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub events: usize,
    pub new: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub snapshot_keys: usize,
}

impl Config {
    pub fn calendar_meta(&self) -> CalendarMeta {
        CalendarMeta {
            name: self.calendar_name.clone(),
            timezone: self.calendar_timezone.clone(),
        }
    }

    pub fn feed_meta(&self) -> FeedMeta {
        FeedMeta {
            title: self.feed_title.clone(),
            description: self.feed_description.clone(),
            link: self.feed_link.clone(),
            default_link: self.default_link.clone(),
            ttl_minutes: self.feed_ttl_minutes,
        }
    }
}

/// Fetch, track, render and persist once.
///
/// Nothing is written unless every step before it succeeded: a corrupt
/// snapshot or a page that fails to parse leaves the previous artifacts and
/// snapshot untouched.
pub async fn run_once(
    cfg: &Config,
    source: &dyn PageSource,
    store: &dyn SnapshotStore,
) -> Result<RunSummary> {
    let mut snapshot = store.load().context("loading snapshot")?;
    let keys_before = snapshot.len();

    let (html, page) = fetch_and_extract(source).await?;
    write_atomic(&cfg.html_path(), &html).context("saving fetched page")?;

    let enriched = enrich(page.events, page.last_updated, &mut snapshot);

    let ics = render_calendar(&enriched, &cfg.calendar_meta());
    let rss = render_feed(&enriched, &cfg.feed_meta()).context("rendering change feed")?;

    write_atomic(&cfg.ical_path(), &ics)?;
    write_atomic(&cfg.rss_path(), &rss)?;
    store.save(&snapshot).context("saving snapshot")?;

    let mut summary = RunSummary {
        events: enriched.len(),
        snapshot_keys: snapshot.len(),
        ..RunSummary::default()
    };
    for e in &enriched {
        match e.change {
            Change::New => summary.new += 1,
            Change::Updated => summary.updated += 1,
            Change::Unchanged => summary.unchanged += 1,
        }
    }

    counter!("pipeline_runs_total").increment(1);
    gauge!("pipeline_last_run_ts").set(chrono::Utc::now().timestamp() as f64);

    tracing::info!(
        target: "pipeline",
        events = summary.events,
        new = summary.new,
        updated = summary.updated,
        unchanged = summary.unchanged,
        keys_added = summary.snapshot_keys - keys_before,
        last_updated = %page.last_updated,
        "run complete"
    );
    Ok(summary)
}
