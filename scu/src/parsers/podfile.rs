//! CocoaPods `Podfile` declarations and `Podfile.lock` installed versions

use super::read_source;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

static POD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^pod\s+['"]([^'"]+)['"](?:\s*,\s*['"]([^'"]*)['"])?"#).expect("valid pod pattern")
});

/// A `pod` line from a Podfile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodDeclaration {
    /// Base pod name (subspec suffix removed)
    pub name: String,
    /// Requirement as written, when the second argument is a version
    pub declared_version: Option<String>,
}

/// Parser for `Podfile`
pub struct PodfileParser;

impl PodfileParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, path: &Path) -> Vec<PodDeclaration> {
        match read_source(path) {
            Ok(content) => self.parse_content(&content),
            Err(e) => {
                tracing::warn!("{e:#}");
                Vec::new()
            }
        }
    }

    /// Pod declarations in order; subspecs collapse onto their base pod and
    /// the first declaration wins
    pub fn parse_content(&self, content: &str) -> Vec<PodDeclaration> {
        let mut seen = HashSet::new();
        let mut pods = Vec::new();

        for line in content.lines().map(str::trim) {
            let Some(caps) = POD_PATTERN.captures(line) else {
                continue;
            };
            let Some(full_name) = caps.get(1) else {
                continue;
            };
            let name = base_pod_name(full_name.as_str());
            if !seen.insert(name.to_string()) {
                continue;
            }

            let declared_version = caps
                .get(2)
                .map(|m| m.as_str().trim())
                .filter(|v| looks_like_requirement(v))
                .map(str::to_string);

            pods.push(PodDeclaration {
                name: name.to_string(),
                declared_version,
            });
        }
        pods
    }
}

impl Default for PodfileParser {
    fn default() -> Self {
        Self::new()
    }
}

/// `Firebase/Analytics` → `Firebase`
pub fn base_pod_name(name: &str) -> &str {
    name.split('/').next().unwrap_or(name)
}

fn looks_like_requirement(value: &str) -> bool {
    value
        .trim_start_matches(['~', '>', '<', '=', ' '])
        .starts_with(|c: char| c.is_ascii_digit())
}

#[derive(Debug, Deserialize)]
struct LockDocument {
    #[serde(rename = "PODS", default)]
    pods: Vec<LockEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LockEntry {
    Plain(String),
    WithDependencies(serde_yaml::Mapping),
}

/// Installed pod versions from `Podfile.lock`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledPods {
    entries: Vec<(String, String)>,
}

impl InstalledPods {
    /// Installed version of a pod; subspec entries count for their base pod
    pub fn version_of(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|(entry, _)| base_pod_name(entry) == name)
            })
            .map(|(_, version)| version.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parser for `Podfile.lock`
pub struct PodfileLockParser;

impl PodfileLockParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, path: &Path) -> InstalledPods {
        match read_source(path) {
            Ok(content) => self.parse_content(&content),
            Err(e) => {
                tracing::warn!("{e:#}");
                InstalledPods::default()
            }
        }
    }

    pub fn parse_content(&self, content: &str) -> InstalledPods {
        let document: LockDocument = match serde_yaml::from_str(content) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("Failed to parse Podfile.lock: {e}");
                return InstalledPods::default();
            }
        };

        let mut entries = Vec::new();
        for entry in document.pods {
            match entry {
                LockEntry::Plain(spec) => entries.extend(split_pod_spec(&spec)),
                LockEntry::WithDependencies(map) => entries.extend(
                    map.keys()
                        .filter_map(serde_yaml::Value::as_str)
                        .filter_map(split_pod_spec),
                ),
            }
        }
        InstalledPods { entries }
    }
}

impl Default for PodfileLockParser {
    fn default() -> Self {
        Self::new()
    }
}

/// `"Alamofire (5.8.1)"` → `("Alamofire", "5.8.1")`
fn split_pod_spec(spec: &str) -> Option<(String, String)> {
    let (name, rest) = spec.split_once(" (")?;
    let version = rest.trim_end_matches(')').trim();
    Some((name.trim().to_string(), version.to_string()))
}
