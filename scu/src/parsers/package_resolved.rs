//! `Package.resolved` parsing.
//!
//! Two document shapes exist in the wild:
//!
//! - schema v2/v3: top-level `pins`, each with `identity`, `location` and
//!   `state.version`
//! - schema v1: `object.pins`, each with `package`, `repositoryURL` and a
//!   `state` holding one of `version`, `branch` or `revision`
//!
//! Every field is optional on the wire; absent or null values become `None`
//! and a pin of the wrong shape is skipped on its own rather than failing the
//! whole file.

use super::{DependencyParser, DependencyRecord, file_name_is};
use scu_core::{SourceKind, name_from_url};
use serde::Deserialize;
use std::path::Path;

/// Name used when a pin carries neither a name nor a URL
const UNKNOWN_NAME: &str = "Unknown";

/// Revisions are shortened to this many characters for display
pub const REVISION_DISPLAY_LEN: usize = 8;

// Pins stay untyped until each one is decoded on its own
#[derive(Debug, Deserialize)]
struct ResolvedDocument {
    pins: Option<Vec<serde_json::Value>>,
    object: Option<LegacyObject>,
}

#[derive(Debug, Deserialize)]
struct LegacyObject {
    #[serde(default)]
    pins: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Pin {
    identity: Option<String>,
    location: Option<String>,
    state: Option<PinState>,
}

#[derive(Debug, Deserialize)]
struct LegacyPin {
    package: Option<String>,
    #[serde(rename = "repositoryURL")]
    repository_url: Option<String>,
    state: Option<PinState>,
}

#[derive(Debug, Deserialize)]
struct PinState {
    version: Option<String>,
    branch: Option<String>,
    revision: Option<String>,
}

impl PinState {
    /// Render the legacy state: version, else branch, else short revision
    fn render_legacy(&self) -> Option<String> {
        if let Some(version) = &self.version {
            return Some(version.clone());
        }
        if let Some(branch) = &self.branch {
            return Some(format!("branch: {branch}"));
        }
        self.revision
            .as_deref()
            .map(|revision| format!("revision: {}", short_revision(revision)))
    }
}

/// Decode one pin, skipping it with a warning when its shape is wrong
fn decode_pin<T: for<'de> Deserialize<'de>>(value: serde_json::Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(pin) => Some(pin),
        Err(e) => {
            tracing::warn!("Skipping malformed Package.resolved pin: {e}");
            None
        }
    }
}

/// First eight characters of a commit hash
pub fn short_revision(revision: &str) -> &str {
    match revision.char_indices().nth(REVISION_DISPLAY_LEN) {
        Some((idx, _)) => &revision[..idx],
        None => revision,
    }
}

/// Parser for `Package.resolved` lockfiles
pub struct LockfileParser;

impl LockfileParser {
    pub fn new() -> Self {
        Self
    }

    fn record(name: Option<String>, url: Option<String>, version: Option<String>) -> DependencyRecord {
        let name = name
            .or_else(|| url.as_deref().map(name_from_url))
            .unwrap_or_else(|| UNKNOWN_NAME.to_string());

        DependencyRecord {
            name,
            url,
            version_spec: version,
            source_kind: SourceKind::Lockfile,
            is_local: false,
            owning_module: None,
            is_first_party: false,
        }
    }
}

impl Default for LockfileParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyParser for LockfileParser {
    fn parse_content(&self, content: &str) -> Vec<DependencyRecord> {
        let document: ResolvedDocument = match serde_json::from_str(content) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("Failed to parse Package.resolved: {e}");
                return Vec::new();
            }
        };

        if let Some(pins) = document.pins {
            return pins
                .into_iter()
                .filter_map(decode_pin::<Pin>)
                .map(|pin| {
                    let version = pin.state.and_then(|state| state.version);
                    Self::record(pin.identity, pin.location, version)
                })
                .collect();
        }

        if let Some(object) = document.object {
            return object
                .pins
                .into_iter()
                .filter_map(decode_pin::<LegacyPin>)
                .map(|pin| {
                    let version = pin.state.as_ref().and_then(PinState::render_legacy);
                    Self::record(pin.package, pin.repository_url, version)
                })
                .collect();
        }

        tracing::warn!("Package.resolved has neither `pins` nor `object.pins`");
        Vec::new()
    }

    fn can_parse(&self, path: &Path) -> bool {
        file_name_is(path, "Package.resolved")
    }
}
