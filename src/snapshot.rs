// src/snapshot.rs
//! Run-to-run memory: first-seen timestamps per event identity and per content
//! fingerprint, and the stores that persist them between runs.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{SnapshotError, SnapshotResult};
use crate::ingest::extract::collapse_ws;

/// Two independent first-seen tables.
///
/// Keys are only ever inserted, never overwritten or removed; entries for events
/// that vanished from the page stay around.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    /// identity -> first time the logical event was seen
    #[serde(default)]
    created: BTreeMap<String, DateTime<Utc>>,
    /// fingerprint -> first time this exact row content was seen
    #[serde(default)]
    modified: BTreeMap<String, DateTime<Utc>>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored creation time for `identity`, recording `now` if it is unknown.
    pub fn created_or_insert(&mut self, identity: &str, now: DateTime<Utc>) -> DateTime<Utc> {
        *self.created.entry(identity.to_string()).or_insert(now)
    }

    /// Stored first-seen time for `fingerprint`, recording `now` if it is unknown.
    pub fn modified_or_insert(&mut self, fingerprint: &str, now: DateTime<Utc>) -> DateTime<Utc> {
        *self.modified.entry(fingerprint.to_string()).or_insert(now)
    }

    pub fn created(&self, identity: &str) -> Option<DateTime<Utc>> {
        self.created.get(identity).copied()
    }

    pub fn modified(&self, fingerprint: &str) -> Option<DateTime<Utc>> {
        self.modified.get(fingerprint).copied()
    }

    pub fn contains_identity(&self, identity: &str) -> bool {
        self.created.contains_key(identity)
    }

    pub fn contains_fingerprint(&self, fingerprint: &str) -> bool {
        self.modified.contains_key(fingerprint)
    }

    /// Total number of keys over both tables.
    pub fn len(&self) -> usize {
        self.created.len() + self.modified.len()
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.modified.is_empty()
    }

    /// Serialize to the persisted JSON document.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a persisted document.
    ///
    /// Accepts the current two-table layout as well as the older single flat
    /// `{key: iso8601}` object, where identities and fingerprints shared one
    /// namespace. Identities are the keys containing `::`; their whitespace is
    /// normalized the way the extractor normalizes cell text.
    pub fn from_json(text: &str) -> Result<Self, String> {
        let value: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
        let Value::Object(map) = value else {
            return Err("top-level value is not an object".to_string());
        };

        for k in ["created", "modified"] {
            if map.get(k).is_some_and(|v| !v.is_object()) {
                return Err(format!("{k:?} must be an object of timestamps"));
            }
        }

        let two_table = !map.is_empty()
            && map
                .iter()
                .all(|(k, v)| (k == "created" || k == "modified") && v.is_object());
        if two_table || map.is_empty() {
            return serde_json::from_value(Value::Object(map)).map_err(|e| e.to_string());
        }

        let mut snap = Snapshot::default();
        for (key, v) in map {
            let Some(s) = v.as_str() else {
                return Err(format!("value for {key:?} is not a timestamp string"));
            };
            let ts = parse_legacy_timestamp(s).ok_or_else(|| format!("bad timestamp {s:?} for {key:?}"))?;
            if key.contains("::") {
                // Keys that collapse to the same identity keep the earliest sighting.
                let entry = snap.created.entry(normalize_legacy_identity(&key)).or_insert(ts);
                *entry = (*entry).min(ts);
            } else {
                snap.modified.insert(key, ts);
            }
        }
        Ok(snap)
    }
}

/// `{year}::{city}, {country}::{title}` with every part trimmed and inner runs
/// of whitespace collapsed. Older writers kept cell text verbatim.
fn normalize_legacy_identity(key: &str) -> String {
    let mut parts = key.splitn(3, "::").map(collapse_ws);
    let year = parts.next().unwrap_or_default();
    let place = parts.next().unwrap_or_default();
    let place = match place.rsplit_once(',') {
        Some((city, country)) => format!("{}, {}", city.trim(), country.trim()),
        None => place,
    };
    match parts.next() {
        Some(title) => format!("{year}::{place}::{title}"),
        None => format!("{year}::{place}"),
    }
}

fn parse_legacy_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Offset-less ISO-8601, taken as UTC.
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|n| n.and_utc())
}

/// Durable home of a [`Snapshot`]: load everything at run start, replace
/// everything at run end.
pub trait SnapshotStore: Send + Sync {
    /// Load the stored snapshot, or an empty one if nothing was stored yet.
    fn load(&self) -> SnapshotResult<Snapshot>;
    /// Replace the stored snapshot in full. Readers must never observe a partial write.
    fn save(&self, snapshot: &Snapshot) -> SnapshotResult<()>;
}

/// JSON document on local disk, replaced via write-to-temp + rename.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn io_err(&self, source: io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> SnapshotResult<Snapshot> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(target: "snapshot", path = %self.path.display(), "no snapshot yet, starting empty");
                return Ok(Snapshot::default());
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(SnapshotError::Corrupt {
                    path: self.path.clone(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(self.io_err(e)),
        };
        let snap = Snapshot::from_json(&text).map_err(|reason| SnapshotError::Corrupt {
            path: self.path.clone(),
            reason,
        })?;
        tracing::debug!(target: "snapshot", keys = snap.len(), path = %self.path.display(), "snapshot loaded");
        Ok(snap)
    }

    fn save(&self, snapshot: &Snapshot) -> SnapshotResult<()> {
        let json = snapshot
            .to_json()
            .map_err(|e| self.io_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| self.io_err(e))?;
        }
        let tmp = self.tmp_path();
        let res = (|| -> io::Result<()> {
            let mut f = fs::File::create(&tmp)?;
            f.write_all(json.as_bytes())?;
            f.sync_all()?;
            fs::rename(&tmp, &self.path)
        })();
        if let Err(e) = res {
            let _ = fs::remove_file(&tmp);
            return Err(self.io_err(e));
        }
        tracing::debug!(target: "snapshot", keys = snapshot.len(), path = %self.path.display(), "snapshot saved");
        Ok(())
    }
}

// --- Test helper ---
/// Keeps the serialized document in memory; goes through the same JSON codec
/// as [`JsonFileStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    doc: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(doc: impl Into<String>) -> Self {
        Self {
            doc: Mutex::new(Some(doc.into())),
        }
    }

    pub fn document(&self) -> Option<String> {
        self.doc.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> SnapshotResult<Snapshot> {
        match self.document() {
            None => Ok(Snapshot::default()),
            Some(doc) => Snapshot::from_json(&doc).map_err(|reason| SnapshotError::Corrupt {
                path: PathBuf::from("<memory>"),
                reason,
            }),
        }
    }

    fn save(&self, snapshot: &Snapshot) -> SnapshotResult<()> {
        let json = snapshot.to_json().map_err(|e| SnapshotError::Io {
            path: PathBuf::from("<memory>"),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })?;
        *self.doc.lock().unwrap_or_else(|p| p.into_inner()) = Some(json);
        Ok(())
    }
}
