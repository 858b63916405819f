//! Direct package references from `project.pbxproj`.
//!
//! Xcode's project format is an old-style property list. It is not parsed
//! structurally; instead three increasingly permissive strategies are tried in
//! order and the first that yields anything wins:
//!
//! 1. [`Strategy::Section`]: blocks inside the `XCRemoteSwiftPackageReference`
//!    section, with names taken from the block comments
//! 2. [`Strategy::ReferenceFragments`]: `isa = XCRemoteSwiftPackageReference;`
//!    fragments anywhere in the file
//! 3. [`Strategy::BareUrls`]: any `repositoryURL` pointing at a known code host

use super::package_resolved::short_revision;
use super::{DependencyParser, DependencyRecord, file_name_is, read_source};
use crate::normalizer::dedup_by_url;
use regex::Regex;
use scu_core::SourceKind;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

/// Hosts accepted by the bare-URL strategy
const CODE_HOSTS: &[&str] = &["github.com", "gitlab.com", "bitbucket.org"];

/// Characters searched after a URL when looking for its requirement
const CONTEXT_WINDOW: usize = 500;

static SECTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)/\* Begin XCRemoteSwiftPackageReference section \*/(.*?)/\* End XCRemoteSwiftPackageReference section \*/",
    )
    .expect("valid section pattern")
});

// One level of nesting for the `requirement = { ... };` dictionary
static BLOCK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)([0-9A-Fa-f]+)\s*/\*\s*(.*?)\s*\*/\s*=\s*\{((?:[^{}]|\{[^{}]*\})*)\};")
        .expect("valid block pattern")
});

static QUOTED_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)""#).expect("valid name pattern"));

static REPOSITORY_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"repositoryURL\s*=\s*"([^"]+)""#).expect("valid url pattern")
});

static REQUIREMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"requirement\s*=\s*\{([^{}]*)\}").expect("valid requirement pattern")
});

static FRAGMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"isa\s*=\s*XCRemoteSwiftPackageReference;\s*repositoryURL\s*=\s*"([^"]+)""#)
        .expect("valid fragment pattern")
});

static HTTPS_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"repositoryURL\s*=\s*"(https://[^"]+)""#).expect("valid url pattern")
});

static KIND_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bkind\s*=\s*([^;]+);").expect("valid kind pattern"));

// `name = value;` with a quoted or bare value
static FIELD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(\w+)\s*=\s*(?:"([^"]*)"|([^;\s]+))\s*;"#).expect("valid field pattern")
});

static URL_REQUIREMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"repositoryURL\s*=\s*"([^"]+)";\s*requirement\s*=\s*\{([^{}]*)\}"#)
        .expect("valid url requirement pattern")
});

// Start of the next object or reference; bounds a URL's search window
static NEXT_OBJECT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bisa\s*=|repositoryURL\s*=").expect("valid object pattern")
});

/// How a package reference pins its version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementSpec {
    ExactVersion(String),
    UpToNextMajorVersion(String),
    UpToNextMinorVersion(String),
    VersionRange { min: String, max: Option<String> },
    Branch(String),
    Revision(String),
}

impl RequirementSpec {
    /// Parse the body of a `requirement = { ... }` dictionary.
    ///
    /// An unknown kind or a missing field gives `None`.
    pub fn parse(body: &str) -> Option<Self> {
        let kind = KIND_PATTERN.captures(body)?.get(1)?.as_str();
        let kind = kind.trim().trim_matches('"');

        let spec = match kind {
            "exactVersion" => Self::ExactVersion(field(body, "version")?),
            "upToNextMajorVersion" => Self::UpToNextMajorVersion(field(body, "minimumVersion")?),
            "upToNextMinorVersion" => Self::UpToNextMinorVersion(field(body, "minimumVersion")?),
            "versionRange" => Self::VersionRange {
                min: field(body, "minimumVersion")?,
                max: field(body, "maximumVersion"),
            },
            "branch" => Self::Branch(field(body, "branch")?),
            "revision" => Self::Revision(field(body, "revision")?),
            other => {
                tracing::debug!("unsupported requirement kind: {other}");
                return None;
            }
        };
        Some(spec)
    }

    /// Render as a displayable version string
    pub fn render(&self) -> String {
        match self {
            Self::ExactVersion(version) => version.clone(),
            Self::UpToNextMajorVersion(min) | Self::UpToNextMinorVersion(min) => {
                format!("~> {min}")
            }
            Self::VersionRange { min, max: Some(max) } => format!("{min} ... {max}"),
            Self::VersionRange { min, max: None } => format!(">= {min}"),
            Self::Branch(branch) => format!("branch: {branch}"),
            Self::Revision(revision) => format!("revision: {}", short_revision(revision)),
        }
    }
}

/// Value of `name = value;` inside a requirement body, quoted or bare
fn field(body: &str, name: &str) -> Option<String> {
    let caps = FIELD_PATTERN
        .captures_iter(body)
        .find(|caps| caps.get(1).is_some_and(|key| key.as_str() == name))?;
    caps.get(2)
        .or_else(|| caps.get(3))
        .map(|m| m.as_str().to_string())
        .filter(|value| !value.is_empty())
}

fn render_requirement(body: &str) -> Option<String> {
    RequirementSpec::parse(body).map(|spec| spec.render())
}

/// Which extraction strategy produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Section,
    ReferenceFragments,
    BareUrls,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Section => write!(f, "section"),
            Strategy::ReferenceFragments => write!(f, "reference fragments"),
            Strategy::BareUrls => write!(f, "bare urls"),
        }
    }
}

/// Records extracted from one project file
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub records: Vec<DependencyRecord>,
    /// `None` when no strategy found anything
    pub strategy: Option<Strategy>,
}

/// Extractor for package references in `project.pbxproj`
pub struct ProjectFileExtractor;

impl ProjectFileExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Read and extract from a project file; unreadable files extract nothing
    pub fn extract(&self, path: &Path) -> Extraction {
        match read_source(path) {
            Ok(content) => {
                let extraction = self.extract_content(&content);
                match extraction.strategy {
                    Some(strategy) => tracing::debug!(
                        path = %path.display(),
                        count = extraction.records.len(),
                        "package references extracted via {strategy}"
                    ),
                    None => tracing::debug!(path = %path.display(), "no package references"),
                }
                extraction
            }
            Err(e) => {
                tracing::warn!("{e:#}");
                Extraction::default()
            }
        }
    }

    /// Run the strategy chain over project file content
    pub fn extract_content(&self, content: &str) -> Extraction {
        let strategies: [(Strategy, fn(&str) -> Vec<DependencyRecord>); 3] = [
            (Strategy::Section, from_section),
            (Strategy::ReferenceFragments, from_fragments),
            (Strategy::BareUrls, from_bare_urls),
        ];

        for (strategy, run) in strategies {
            let records = dedup_by_url(run(content));
            if !records.is_empty() {
                return Extraction {
                    records,
                    strategy: Some(strategy),
                };
            }
        }
        Extraction::default()
    }
}

impl Default for ProjectFileExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyParser for ProjectFileExtractor {
    fn parse_content(&self, content: &str) -> Vec<DependencyRecord> {
        self.extract_content(content).records
    }

    fn can_parse(&self, path: &Path) -> bool {
        file_name_is(path, "project.pbxproj")
    }

    fn parse(&self, path: &Path) -> Vec<DependencyRecord> {
        self.extract(path).records
    }
}

fn project_record(url: &str, version_spec: Option<String>) -> DependencyRecord {
    DependencyRecord::remote(url, version_spec, SourceKind::ProjectFile)
}

fn from_section(content: &str) -> Vec<DependencyRecord> {
    let Some(section) = SECTION_PATTERN.captures(content).and_then(|c| c.get(1)) else {
        return Vec::new();
    };

    let mut records = Vec::new();
    for block in BLOCK_PATTERN.captures_iter(section.as_str()) {
        let comment = block.get(2).map_or("", |m| m.as_str());
        let body = block.get(3).map_or("", |m| m.as_str());

        let Some(url) = REPOSITORY_URL_PATTERN
            .captures(body)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
        else {
            continue;
        };

        let version = REQUIREMENT_PATTERN
            .captures(body)
            .and_then(|c| c.get(1))
            .and_then(|m| render_requirement(m.as_str()));

        let record = project_record(url, version);
        let name = block_name(comment);
        records.push(match name {
            Some(name) => record.with_name(name),
            None => record,
        });
    }
    records
}

/// Name from a block comment such as `XCRemoteSwiftPackageReference "Alamofire"`
fn block_name(comment: &str) -> Option<&str> {
    let quoted = QUOTED_NAME_PATTERN
        .captures(comment)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim());
    quoted
        .or(Some(comment.trim()))
        .filter(|name| !name.is_empty())
}

fn from_fragments(content: &str) -> Vec<DependencyRecord> {
    FRAGMENT_PATTERN
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|url| {
            let version = requirement_for_url(content, url.as_str(), url.end());
            project_record(url.as_str(), version)
        })
        .collect()
}

/// Find the requirement for `url`: first directly after its declaration
/// anywhere in the file, then in the text that follows the match up to the
/// next object
fn requirement_for_url(content: &str, url: &str, end: usize) -> Option<String> {
    let direct = URL_REQUIREMENT_PATTERN
        .captures_iter(content)
        .find(|caps| caps.get(1).is_some_and(|m| m.as_str() == url))
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str());

    let body = direct.or_else(|| {
        REQUIREMENT_PATTERN
            .captures(following_window(content, end))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    })?;

    render_requirement(body)
}

/// Up to `CONTEXT_WINDOW` bytes after `end`, cut at the next object
fn following_window(content: &str, end: usize) -> &str {
    let mut to = (end + CONTEXT_WINDOW).min(content.len());
    while !content.is_char_boundary(to) {
        to += 1;
    }
    let window = &content[end..to];
    match NEXT_OBJECT_PATTERN.find(window) {
        Some(next) => &window[..next.start()],
        None => window,
    }
}

fn from_bare_urls(content: &str) -> Vec<DependencyRecord> {
    HTTPS_URL_PATTERN
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|url| is_code_host(url))
        .map(|url| project_record(url, None))
        .collect()
}

fn is_code_host(url: &str) -> bool {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_lowercase))
        .is_some_and(|host| {
            let host = host.strip_prefix("www.").unwrap_or(&host);
            CODE_HOSTS.contains(&host)
        })
}
