use super::{DependencyParser, DependencyRecord};
use regex::Regex;
use scu_core::SourceKind;
use std::path::Path;
use std::sync::LazyLock;

static PACKAGE_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*SWIFTPM_PACKAGE_URL\s*=\s*([^\n]+)$").expect("valid xcconfig pattern")
});

/// Parser for package URLs in `.xcconfig` build settings files.
///
/// Only `SWIFTPM_PACKAGE_URL = <url>` assignments are understood; they never
/// carry a version.
pub struct BuildSettingsParser;

impl BuildSettingsParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BuildSettingsParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyParser for BuildSettingsParser {
    fn parse_content(&self, content: &str) -> Vec<DependencyRecord> {
        PACKAGE_URL_PATTERN
            .captures_iter(content)
            .filter_map(|caps| caps.get(1))
            .map(|m| strip_trailing_comment(m.as_str()).trim())
            .filter(|url| !url.is_empty())
            .map(|url| DependencyRecord::remote(url, None, SourceKind::BuildSettings))
            .collect()
    }

    fn can_parse(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "xcconfig")
    }
}

/// xcconfig comments start with `//`, but `://` belongs to the URL
fn strip_trailing_comment(value: &str) -> &str {
    let mut search_from = 0;
    while let Some(pos) = value[search_from..].find("//") {
        let idx = search_from + pos;
        if idx > 0 && value[..idx].ends_with(':') {
            search_from = idx + 2;
            continue;
        }
        return &value[..idx];
    }
    value
}
