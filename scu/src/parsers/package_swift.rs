use super::{DependencyParser, DependencyRecord, file_name_is};
use regex::Regex;
use scu_core::SourceKind;
use std::ffi::OsStr;
use std::path::Path;
use std::sync::LazyLock;

/// Domains whose packages are tagged as first-party
const FIRST_PARTY_DOMAINS: &[&str] = &["apple.com"];

/// Remote declarations: each captures the URL and the version selector value
static REMOTE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Exact floor, pinned, branch and revision selectors
        r#"\.package\(url:\s*"([^"]+)",\s*from:\s*"([^"]+)"\)"#,
        r#"\.package\(url:\s*"([^"]+)",\s*exact:\s*"([^"]+)"\)"#,
        r#"\.package\(url:\s*"([^"]+)",\s*branch:\s*"([^"]+)"\)"#,
        r#"\.package\(url:\s*"([^"]+)",\s*revision:\s*"([^"]+)"\)"#,
        // Range selectors
        r#"\.package\(url:\s*"([^"]+)",\s*\.upToNextMajor\(from:\s*"([^"]+)"\)\)"#,
        r#"\.package\(url:\s*"([^"]+)",\s*\.upToNextMinor\(from:\s*"([^"]+)"\)\)"#,
        // Pinned via string literal initializer
        r#"\.package\(url:\s*"([^"]+)",\s*exact:\s*\.init\(stringLiteral:\s*"([^"]+)"\)\)"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid manifest pattern"))
    .collect()
});

static LOCAL_PATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\.package\(path:\s*"([^"]+)"\)"#).expect("valid local pattern")
});

static LOCAL_NAMED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\.package\(name:\s*"([^"]+)",\s*path:\s*"([^"]+)"\)"#)
        .expect("valid local pattern")
});

/// Parser for `Package.swift` manifests
pub struct ManifestParser;

impl ManifestParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a manifest declared by `module`, tagging every record with it
    pub fn parse_module(&self, path: &Path, module: &str) -> Vec<DependencyRecord> {
        self.parse(path)
            .into_iter()
            .map(|record| record.with_module(module))
            .collect()
    }

    fn is_first_party(url: &str) -> bool {
        let lower = url.to_lowercase();
        FIRST_PARTY_DOMAINS.iter().any(|domain| lower.contains(domain))
    }
}

impl Default for ManifestParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyParser for ManifestParser {
    fn parse_content(&self, content: &str) -> Vec<DependencyRecord> {
        // (offset, record) so the result follows declaration order
        let mut found: Vec<(usize, DependencyRecord)> = Vec::new();

        for pattern in REMOTE_PATTERNS.iter() {
            for caps in pattern.captures_iter(content) {
                let (Some(whole), Some(url), Some(version)) = (caps.get(0), caps.get(1), caps.get(2))
                else {
                    continue;
                };
                let mut record = DependencyRecord::remote(
                    url.as_str(),
                    Some(version.as_str().to_string()),
                    SourceKind::Manifest,
                );
                record.is_first_party = Self::is_first_party(url.as_str());
                found.push((whole.start(), record));
            }
        }

        for caps in LOCAL_PATH_PATTERN.captures_iter(content) {
            let (Some(whole), Some(path)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let name = Path::new(path.as_str())
                .file_name()
                .and_then(OsStr::to_str)
                .unwrap_or(path.as_str());
            found.push((
                whole.start(),
                DependencyRecord::local(name, SourceKind::Manifest),
            ));
        }

        for caps in LOCAL_NAMED_PATTERN.captures_iter(content) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            found.push((
                whole.start(),
                DependencyRecord::local(name.as_str(), SourceKind::Manifest),
            ));
        }

        found.sort_by_key(|(offset, _)| *offset);
        found.into_iter().map(|(_, record)| record).collect()
    }

    fn can_parse(&self, path: &Path) -> bool {
        file_name_is(path, "Package.swift")
    }
}
