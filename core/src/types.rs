use crate::version::{NOT_AVAILABLE, NOT_CACHED, Staleness};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a dependency declaration was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// `Package.swift`
    Manifest,
    /// `Package.resolved`
    Lockfile,
    /// `project.pbxproj`
    ProjectFile,
    /// `*.xcconfig`
    BuildSettings,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Manifest => write!(f, "Package.swift"),
            SourceKind::Lockfile => write!(f, "Package.resolved"),
            SourceKind::ProjectFile => write!(f, "project.pbxproj"),
            SourceKind::BuildSettings => write!(f, "xcconfig"),
        }
    }
}

/// A dependency as parsed from any of the supported sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// Package identity, explicit or derived from the URL
    pub name: String,
    /// Source location; `None` for path-based declarations
    pub url: Option<String>,
    /// Declared constraint as written (or rendered from a requirement block)
    pub version_spec: Option<String>,
    pub source_kind: SourceKind,
    /// Path-based dependency, never resolved or conflict-checked
    pub is_local: bool,
    /// Module whose manifest declared this dependency
    pub owning_module: Option<String>,
    /// Hosted on a first-party vendor domain (presentation only)
    pub is_first_party: bool,
}

impl DependencyRecord {
    /// A remote dependency identified by its URL
    pub fn remote(url: &str, version_spec: Option<String>, source_kind: SourceKind) -> Self {
        Self {
            name: name_from_url(url),
            url: Some(url.to_string()),
            version_spec,
            source_kind,
            is_local: false,
            owning_module: None,
            is_first_party: false,
        }
    }

    /// A path-based dependency
    pub fn local(name: &str, source_kind: SourceKind) -> Self {
        Self {
            name: name.to_string(),
            url: None,
            version_spec: None,
            source_kind,
            is_local: true,
            owning_module: None,
            is_first_party: false,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_module(mut self, module: &str) -> Self {
        self.owning_module = Some(module.to_string());
        self
    }

    pub fn url_or_sentinel(&self) -> &str {
        self.url.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn version_or_sentinel(&self) -> &str {
        self.version_spec.as_deref().unwrap_or(NOT_AVAILABLE)
    }
}

/// Derive a package name from a repository URL: the last path segment with
/// any `.git` suffix removed.
pub fn name_from_url(url: &str) -> String {
    let segment = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url);
    segment.strip_suffix(".git").unwrap_or(segment).to_string()
}

/// One module's declaration of a conflicting package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictOccurrence {
    pub version_spec: String,
    pub module_name: String,
}

/// A package declared with more than one distinct version across modules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub package_name: String,
    /// Every declaration, in discovery order
    pub occurrences: Vec<ConflictOccurrence>,
}

impl ConflictRecord {
    /// Distinct version specs in first-seen order
    pub fn distinct_versions(&self) -> Vec<&str> {
        let mut versions: Vec<&str> = Vec::new();
        for occurrence in &self.occurrences {
            if !versions.contains(&occurrence.version_spec.as_str()) {
                versions.push(&occurrence.version_spec);
            }
        }
        versions
    }
}

/// Outcome of looking up the latest published version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LatestVersion {
    Found(String),
    /// Lookup failed or the host is unsupported
    Unavailable,
    /// Cache-only mode and no cached entry
    NotCached,
}

impl LatestVersion {
    pub fn as_version(&self) -> Option<&str> {
        match self {
            LatestVersion::Found(v) => Some(v),
            LatestVersion::Unavailable | LatestVersion::NotCached => None,
        }
    }
}

impl fmt::Display for LatestVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LatestVersion::Found(v) => f.write_str(v),
            LatestVersion::Unavailable => f.write_str(NOT_AVAILABLE),
            LatestVersion::NotCached => f.write_str(NOT_CACHED),
        }
    }
}

/// Result of checking one dependency against its latest version
#[derive(Debug, Clone)]
pub struct DependencyCheck {
    pub dependency: DependencyRecord,
    pub latest: LatestVersion,
    pub status: Staleness,
}

impl DependencyCheck {
    pub fn new(dependency: DependencyRecord, latest: LatestVersion) -> Self {
        let status = Staleness::classify(dependency.version_spec.as_deref(), latest.as_version());
        Self {
            dependency,
            latest,
            status,
        }
    }

    /// Check if the dependency is behind the latest release
    pub fn is_outdated(&self) -> bool {
        matches!(
            self.status,
            Staleness::MajorBehind | Staleness::MinorBehind
        )
    }
}
