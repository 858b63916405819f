//! Durable cache of latest-version lookups.
//!
//! The cache is a single JSON object keyed by repository URL (or
//! `cocoapods:<name>` for pods):
//!
//! ```json
//! {
//!   "https://github.com/Alamofire/Alamofire.git": {
//!     "version": "5.9.1",
//!     "timestamp": "2026-10-17T08:15:00.123456Z"
//!   }
//! }
//! ```
//!
//! The file is read once when the cache is opened and rewritten in full after
//! every insert.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Age after which an entry no longer short-circuits online lookups
pub const CACHE_TTL_HOURS: i64 = 24;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to write cache {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A cached lookup result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntry {
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawEntry {
    version: String,
    timestamp: String,
}

/// RFC 3339, or a naive ISO-8601 timestamp taken as UTC
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// File-backed version cache
#[derive(Debug)]
pub struct VersionCache {
    path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
    ttl: TimeDelta,
    dirty: bool,
}

impl VersionCache {
    /// Open the cache at `path`, loading any existing entries.
    ///
    /// A missing or unreadable file starts an empty cache.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::load(&path);
        tracing::debug!(
            path = %path.display(),
            entries = entries.len(),
            "version cache opened"
        );
        Self {
            path,
            entries,
            ttl: TimeDelta::hours(CACHE_TTL_HOURS),
            dirty: false,
        }
    }

    fn load(path: &Path) -> BTreeMap<String, CacheEntry> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read cache {}: {e}", path.display());
                return BTreeMap::new();
            }
        };

        let raw: BTreeMap<String, RawEntry> = match serde_json::from_str(&content) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Ignoring corrupt cache {}: {e}", path.display());
                return BTreeMap::new();
            }
        };

        raw.into_iter()
            .filter_map(|(key, entry)| match parse_timestamp(&entry.timestamp) {
                Some(timestamp) => Some((
                    key,
                    CacheEntry {
                        version: entry.version,
                        timestamp,
                    },
                )),
                None => {
                    tracing::warn!("Dropping cache entry {key}: bad timestamp");
                    None
                }
            })
            .collect()
    }

    /// Entry for `key` regardless of age
    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Entry for `key` if younger than the TTL
    pub fn get_fresh(&self, key: &str) -> Option<&CacheEntry> {
        self.get_fresh_at(key, Utc::now())
    }

    fn get_fresh_at(&self, key: &str, now: DateTime<Utc>) -> Option<&CacheEntry> {
        self.entries
            .get(key)
            .filter(|entry| now - entry.timestamp < self.ttl)
    }

    /// Record a lookup result and rewrite the cache file
    pub fn insert(&mut self, key: &str, version: &str) -> Result<(), CacheError> {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                version: version.to_string(),
                timestamp: Utc::now(),
            },
        );
        self.dirty = true;
        self.flush()
    }

    /// Write every entry to disk
    pub fn flush(&mut self) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| CacheError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        fs::write(&self.path, json).map_err(|source| CacheError::Write {
            path: self.path.clone(),
            source,
        })?;
        self.dirty = false;
        Ok(())
    }

    /// Flush pending changes and release the cache
    pub fn close(mut self) -> Result<(), CacheError> {
        if self.dirty {
            self.flush()?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seed(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("version_cache.json");
        fs::write(&path, body).expect("write cache fixture");
        path
    }

    fn aged(hours: i64) -> String {
        (Utc::now() - TimeDelta::hours(hours)).to_rfc3339()
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = TempDir::new().expect("tempdir");
        let cache = VersionCache::open(dir.path().join("nope.json"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_freshness_window() {
        let dir = TempDir::new().expect("tempdir");
        let body = format!(
            r#"{{
                "https://github.com/a/fresh.git": {{ "version": "1.0.0", "timestamp": "{}" }},
                "https://github.com/a/stale.git": {{ "version": "2.0.0", "timestamp": "{}" }}
            }}"#,
            aged(23),
            aged(25)
        );
        let cache = VersionCache::open(seed(&dir, &body));

        assert_eq!(cache.len(), 2);
        assert!(cache.get_fresh("https://github.com/a/fresh.git").is_some());
        assert!(cache.get_fresh("https://github.com/a/stale.git").is_none());
        // Any age counts for a plain read
        assert_eq!(
            cache
                .get("https://github.com/a/stale.git")
                .map(|e| e.version.as_str()),
            Some("2.0.0")
        );
    }

    #[test]
    fn test_naive_timestamps_read_as_utc() {
        let dir = TempDir::new().expect("tempdir");
        let body = r#"{ "k": { "version": "1.2.3", "timestamp": "2024-03-01T10:20:30.123456" } }"#;
        let cache = VersionCache::open(seed(&dir, body));

        let entry = cache.get("k").expect("entry loaded");
        assert_eq!(entry.timestamp.to_rfc3339(), "2024-03-01T10:20:30.123456+00:00");
    }

    #[test]
    fn test_bad_entries_and_corrupt_files_are_dropped() {
        let dir = TempDir::new().expect("tempdir");
        let body = r#"{ "k": { "version": "1.2.3", "timestamp": "yesterday" } }"#;
        assert!(VersionCache::open(seed(&dir, body)).is_empty());

        let dir = TempDir::new().expect("tempdir");
        assert!(VersionCache::open(seed(&dir, "{ broken")).is_empty());
    }

    #[test]
    fn test_insert_writes_through() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("nested").join("version_cache.json");

        let mut cache = VersionCache::open(&path);
        cache
            .insert("https://github.com/a/b.git", "3.1.0")
            .expect("insert flushes");
        assert!(path.exists());

        let reopened = VersionCache::open(&path);
        let entry = reopened.get_fresh("https://github.com/a/b.git").expect("fresh entry");
        assert_eq!(entry.version, "3.1.0");
        cache.close().expect("close");
    }

    #[test]
    fn test_get_fresh_at_boundary() {
        let dir = TempDir::new().expect("tempdir");
        let mut cache = VersionCache::open(dir.path().join("c.json"));
        cache.insert("k", "1.0.0").expect("insert");

        let stored = cache.get("k").expect("entry").timestamp;
        assert!(cache.get_fresh_at("k", stored + TimeDelta::hours(24)).is_none());
        assert!(
            cache
                .get_fresh_at("k", stored + TimeDelta::hours(24) - TimeDelta::seconds(1))
                .is_some()
        );
    }
}
