pub mod package_resolved;
pub mod package_swift;
pub mod pbxproj;
pub mod podfile;
pub mod xcconfig;

pub use package_resolved::LockfileParser;
pub use package_swift::ManifestParser;
pub use pbxproj::{Extraction, ProjectFileExtractor, RequirementSpec, Strategy};
pub use podfile::{InstalledPods, PodDeclaration, PodfileLockParser, PodfileParser};
pub use xcconfig::BuildSettingsParser;

// Re-export the record type from core for use by parsers
pub use scu_core::DependencyRecord;

use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::fs;
use std::path::Path;

/// Trait for dependency file parsers.
///
/// Parsing never fails: unreadable or malformed input degrades to an empty
/// result and a warning.
pub trait DependencyParser {
    /// Parse already-loaded file content
    fn parse_content(&self, content: &str) -> Vec<DependencyRecord>;

    /// Check if this parser can handle the given file
    fn can_parse(&self, path: &Path) -> bool;

    /// Read a file and parse it
    fn parse(&self, path: &Path) -> Vec<DependencyRecord> {
        match read_source(path) {
            Ok(content) => {
                let records = self.parse_content(&content);
                tracing::debug!(
                    path = %path.display(),
                    count = records.len(),
                    "parsed dependency declarations"
                );
                records
            }
            Err(e) => {
                tracing::warn!("{e:#}");
                Vec::new()
            }
        }
    }
}

/// Read a text source file as UTF-8
pub fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn file_name_is(path: &Path, expected: &str) -> bool {
    path.file_name().and_then(OsStr::to_str) == Some(expected)
}
