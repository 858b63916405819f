//! JSON report written after each run.
//!
//! Absent values are rendered as `"N/A"` (or `"N/A (cache)"` for latest
//! versions missing from the cache in cache-only mode).

use crate::analyzer::{Analysis, PodCheck};
use crate::resolver::ResolveMode;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use scu_core::{ConflictRecord, DependencyCheck, DependencyRecord, NOT_AVAILABLE};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
pub struct Report {
    pub project_name: String,
    pub project_root: String,
    pub generated_at: DateTime<Utc>,
    pub mode: &'static str,
    pub statistics: Statistics,
    pub modules: Vec<GroupEntry>,
    pub dependencies: Vec<CheckEntry>,
    pub app_dependencies: Vec<CheckEntry>,
    /// How app references were found in `project.pbxproj`
    pub app_extraction_strategy: Option<String>,
    pub pods: Vec<PodEntry>,
    pub conflicts: Vec<ConflictEntry>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Statistics {
    pub total_modules: usize,
    pub total_unique_dependencies: usize,
    pub total_groups: usize,
    pub total_app_dependencies: usize,
    pub total_pods: usize,
    pub total_conflicts: usize,
    pub outdated: usize,
}

#[derive(Debug, Serialize)]
pub struct GroupEntry {
    pub directory: String,
    pub modules: Vec<ModuleEntry>,
}

#[derive(Debug, Serialize)]
pub struct ModuleEntry {
    pub name: String,
    pub path: String,
    pub dependencies: Vec<DeclaredEntry>,
}

#[derive(Debug, Serialize)]
pub struct DeclaredEntry {
    pub name: String,
    pub url: String,
    pub version: String,
    pub is_local: bool,
    pub is_first_party: bool,
}

impl From<&DependencyRecord> for DeclaredEntry {
    fn from(record: &DependencyRecord) -> Self {
        Self {
            name: record.name.clone(),
            url: record.url_or_sentinel().to_string(),
            version: record.version_or_sentinel().to_string(),
            is_local: record.is_local,
            is_first_party: record.is_first_party,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckEntry {
    pub name: String,
    pub url: String,
    pub version: String,
    pub latest_version: String,
    pub status: String,
    pub status_label: &'static str,
    pub source: String,
    pub is_first_party: bool,
}

impl From<&DependencyCheck> for CheckEntry {
    fn from(check: &DependencyCheck) -> Self {
        let record = &check.dependency;
        Self {
            name: record.name.clone(),
            url: record.url_or_sentinel().to_string(),
            version: record.version_or_sentinel().to_string(),
            latest_version: check.latest.to_string(),
            status: check.status.symbol().to_string(),
            status_label: check.status.label(),
            source: record.source_kind.to_string(),
            is_first_party: record.is_first_party,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PodEntry {
    pub name: String,
    pub declared_version: String,
    pub version: String,
    pub latest_version: String,
    pub status: String,
    pub status_label: &'static str,
}

impl From<&PodCheck> for PodEntry {
    fn from(pod: &PodCheck) -> Self {
        Self {
            name: pod.name.clone(),
            declared_version: pod
                .declared_version
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            version: pod
                .installed_version
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            latest_version: pod.latest.to_string(),
            status: pod.status.symbol().to_string(),
            status_label: pod.status.label(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConflictEntry {
    pub package: String,
    pub versions: Vec<ConflictVersion>,
}

#[derive(Debug, Serialize)]
pub struct ConflictVersion {
    pub version: String,
    pub module: String,
}

impl From<&ConflictRecord> for ConflictEntry {
    fn from(conflict: &ConflictRecord) -> Self {
        Self {
            package: conflict.package_name.clone(),
            versions: conflict
                .occurrences
                .iter()
                .map(|o| ConflictVersion {
                    version: o.version_spec.clone(),
                    module: o.module_name.clone(),
                })
                .collect(),
        }
    }
}

impl Report {
    pub fn new(project_name: &str, project_root: &Path, mode: ResolveMode, analysis: &Analysis) -> Self {
        let statistics = Statistics {
            total_modules: analysis.module_count(),
            total_unique_dependencies: analysis.dependencies.len(),
            total_groups: analysis.module_groups.len(),
            total_app_dependencies: analysis.app_dependencies.len(),
            total_pods: analysis.pods.len(),
            total_conflicts: analysis.conflicts.len(),
            outdated: analysis.outdated_count(),
        };

        let modules = analysis
            .module_groups
            .iter()
            .map(|group| GroupEntry {
                directory: group.directory.clone(),
                modules: group
                    .modules
                    .iter()
                    .map(|module| ModuleEntry {
                        name: module.name.clone(),
                        path: module.relative_path.display().to_string(),
                        dependencies: module.dependencies.iter().map(DeclaredEntry::from).collect(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            project_name: project_name.to_string(),
            project_root: project_root.display().to_string(),
            generated_at: Utc::now(),
            mode: match mode {
                ResolveMode::Online => "online",
                ResolveMode::CacheOnly => "cache_only",
            },
            statistics,
            modules,
            dependencies: analysis.dependencies.iter().map(CheckEntry::from).collect(),
            app_dependencies: analysis.app_dependencies.iter().map(CheckEntry::from).collect(),
            app_extraction_strategy: analysis.app_strategy.map(|s| s.to_string()),
            pods: analysis.pods.iter().map(PodEntry::from).collect(),
            conflicts: analysis.conflicts.iter().map(ConflictEntry::from).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report")
    }

    /// Write the report as `dependency_report_<timestamp>.json` in `dir`
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        let file_name = format!(
            "dependency_report_{}.json",
            self.generated_at.format("%Y%m%d_%H%M%S")
        );
        let path = dir.join(file_name);
        fs::write(&path, self.to_json()?)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        Ok(path)
    }
}
