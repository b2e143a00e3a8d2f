// src/tracker.rs
//! Identity & change tracking across independent runs.
//!
//! Every row gets two keys: an identity (start year, place, title) that stays the
//! same while the page edits an event, and a fingerprint of the raw row markup
//! that changes with any edit. The first time a key is seen its timestamp is
//! recorded in the [`Snapshot`]; later runs read it back. So `created` sticks to
//! the first sighting of the event, and `modified` to the first sighting of its
//! current content.

use chrono::{DateTime, Datelike, Utc};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt::Write as _;

use crate::ingest::types::RawEvent;
use crate::snapshot::Snapshot;

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("tracker_events_total", "Events enriched.");
        describe_counter!("tracker_new_total", "Events whose identity was first seen.");
        describe_counter!(
            "tracker_updated_total",
            "Known events whose row content changed."
        );
        describe_gauge!("snapshot_keys", "Keys held by the snapshot after enrichment.");
    });
}

/// How a row compares to what earlier runs recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Identity never seen before.
    New,
    /// Known identity, row content not seen before.
    Updated,
    /// Row content already seen.
    Unchanged,
}

/// A raw event plus everything derived from the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedEvent {
    pub event: RawEvent,
    pub identity: String,
    pub fingerprint: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    /// Document-level "last updated" stamp of the page this row came from.
    pub last_updated: DateTime<Utc>,
    /// Captured once per run.
    pub generated_at: DateTime<Utc>,
    pub change: Change,
}

/// `{start year}::{city}, {country}::{title}`
pub fn identity(ev: &RawEvent) -> String {
    format!(
        "{}::{}, {}::{}",
        ev.start.year(),
        ev.city,
        ev.country,
        ev.title
    )
}

/// Lowercase hex SHA-256 of the raw row markup.
///
/// Formatting-only edits to the row count as changes.
pub fn fingerprint(ev: &RawEvent) -> String {
    let digest = Sha256::digest(ev.source_fragment.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest.iter() {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Enrich `events` against `snapshot`, stamping the run with the current time.
pub fn enrich(
    events: Vec<RawEvent>,
    document_updated_at: DateTime<Utc>,
    snapshot: &mut Snapshot,
) -> Vec<EnrichedEvent> {
    enrich_at(events, document_updated_at, Utc::now(), snapshot)
}

/// Same as [`enrich`] with an explicit run timestamp.
///
/// Output keeps input order and length. Unknown identities and fingerprints
/// are recorded at `document_updated_at`; known ones return their stored value.
pub fn enrich_at(
    events: Vec<RawEvent>,
    document_updated_at: DateTime<Utc>,
    generated_at: DateTime<Utc>,
    snapshot: &mut Snapshot,
) -> Vec<EnrichedEvent> {
    ensure_metrics_described();

    // Keys first inserted by this run; repeated rows are judged against the
    // snapshot as it was when the run started.
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut seen_fps: HashSet<String> = HashSet::new();
    let mut new_cnt = 0u64;
    let mut updated_cnt = 0u64;
    let mut out = Vec::with_capacity(events.len());
    for event in events {
        let identity = identity(&event);
        let fingerprint = fingerprint(&event);

        let known_identity =
            snapshot.contains_identity(&identity) && !seen_ids.contains(&identity);
        let known_content =
            snapshot.contains_fingerprint(&fingerprint) && !seen_fps.contains(&fingerprint);
        if !snapshot.contains_identity(&identity) {
            seen_ids.insert(identity.clone());
        }
        if !snapshot.contains_fingerprint(&fingerprint) {
            seen_fps.insert(fingerprint.clone());
        }
        let created = snapshot.created_or_insert(&identity, document_updated_at);
        let modified = snapshot.modified_or_insert(&fingerprint, document_updated_at);

        let change = if !known_identity {
            new_cnt += 1;
            tracing::debug!(target: "tracker", %identity, "new event");
            Change::New
        } else if !known_content {
            updated_cnt += 1;
            tracing::debug!(target: "tracker", %identity, %fingerprint, "event content changed");
            Change::Updated
        } else {
            Change::Unchanged
        };

        out.push(EnrichedEvent {
            event,
            identity,
            fingerprint,
            created,
            modified,
            last_updated: document_updated_at,
            generated_at,
            change,
        });
    }

    counter!("tracker_events_total").increment(out.len() as u64);
    counter!("tracker_new_total").increment(new_cnt);
    counter!("tracker_updated_total").increment(updated_cnt);
    gauge!("snapshot_keys").set(snapshot.len() as f64);

    out
}
