//! The analysis pipeline: discovery output → parsed records → canonical
//! dependencies and conflicts → resolved latest versions.

use crate::conflicts::detect_conflicts;
use crate::detector::{DetectedProject, ModuleGroup};
use crate::normalizer::{DependencyIndex, dedup_by_url};
use crate::parsers::{
    BuildSettingsParser, DependencyParser, InstalledPods, LockfileParser, ManifestParser,
    PodDeclaration, PodfileLockParser, PodfileParser, ProjectFileExtractor, Strategy,
};
use crate::resolver::VersionResolver;
use scu_core::{ConflictRecord, DependencyCheck, DependencyRecord, LatestVersion, Staleness};
use std::collections::HashMap;
use std::path::PathBuf;

/// A module with the dependencies its manifest declares
#[derive(Debug, Clone)]
pub struct ParsedModule {
    pub name: String,
    pub relative_path: PathBuf,
    pub dependencies: Vec<DependencyRecord>,
}

#[derive(Debug, Clone)]
pub struct ParsedGroup {
    pub directory: String,
    pub modules: Vec<ParsedModule>,
}

/// Everything parsed from a project before any version lookup
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub module_groups: Vec<ParsedGroup>,
    /// One record per package name across all modules
    pub canonical: DependencyIndex,
    pub conflicts: Vec<ConflictRecord>,
    /// Dependencies referenced directly by the app, one per URL
    pub app_dependencies: Vec<DependencyRecord>,
    /// Strategy that produced the project-file references
    pub app_strategy: Option<Strategy>,
    pub pods: Vec<PodDeclaration>,
    pub installed_pods: InstalledPods,
}

impl Inventory {
    /// Parse every source found in a project
    pub fn collect(detected: &DetectedProject) -> Self {
        let module_groups = parse_modules(&detected.module_groups);

        let module_records: Vec<&DependencyRecord> = module_groups
            .iter()
            .flat_map(|g| &g.modules)
            .flat_map(|m| &m.dependencies)
            .collect();
        let conflicts = detect_conflicts(module_records.iter().copied());
        let canonical: DependencyIndex = module_records.into_iter().cloned().collect();

        let (app_dependencies, app_strategy) = collect_app_dependencies(detected);

        let pods = detected
            .podfile
            .as_deref()
            .map(|path| PodfileParser::new().parse(path))
            .unwrap_or_default();
        let installed_pods = detected
            .podfile_lock
            .as_deref()
            .map(|path| PodfileLockParser::new().parse(path))
            .unwrap_or_default();

        Self {
            module_groups,
            canonical,
            conflicts,
            app_dependencies,
            app_strategy,
            pods,
            installed_pods,
        }
    }

    pub fn module_count(&self) -> usize {
        self.module_groups.iter().map(|g| g.modules.len()).sum()
    }

    /// Number of latest-version lookups `resolve` performs
    pub fn lookup_count(&self) -> usize {
        self.canonical.len()
            + self
                .app_dependencies
                .iter()
                .filter(|d| d.url.is_some())
                .count()
            + self.pods.len()
    }

    /// Look up latest versions for canonical, app and pod dependencies.
    ///
    /// `progress` is called after each lookup with `(done, total)`.
    pub async fn resolve(
        self,
        resolver: &mut VersionResolver,
        mut progress: impl FnMut(usize, usize),
    ) -> Analysis {
        let total = self.lookup_count();
        let mut done = 0;
        let mut seen: HashMap<String, LatestVersion> = HashMap::new();

        let mut dependencies = Vec::with_capacity(self.canonical.len());
        for record in self.canonical.iter() {
            let latest = resolve_url(resolver, &mut seen, record).await;
            done += 1;
            progress(done, total);
            dependencies.push(DependencyCheck::new(record.clone(), latest));
        }

        let mut app_dependencies = Vec::with_capacity(self.app_dependencies.len());
        for record in self.app_dependencies {
            let latest = if record.url.is_some() {
                let latest = resolve_url(resolver, &mut seen, &record).await;
                done += 1;
                progress(done, total);
                latest
            } else {
                LatestVersion::Unavailable
            };
            app_dependencies.push(DependencyCheck::new(record, latest));
        }

        let mut pods = Vec::with_capacity(self.pods.len());
        for pod in self.pods {
            let latest = resolver.latest_pod_version(&pod.name).await;
            done += 1;
            progress(done, total);
            let installed = self.installed_pods.version_of(&pod.name).map(str::to_string);
            pods.push(PodCheck::new(pod, installed, latest));
        }

        Analysis {
            module_groups: self.module_groups,
            dependencies,
            conflicts: self.conflicts,
            app_dependencies,
            app_strategy: self.app_strategy,
            pods,
        }
    }
}

async fn resolve_url(
    resolver: &mut VersionResolver,
    seen: &mut HashMap<String, LatestVersion>,
    record: &DependencyRecord,
) -> LatestVersion {
    let Some(url) = record.url.as_deref() else {
        return LatestVersion::Unavailable;
    };
    if let Some(latest) = seen.get(url) {
        return latest.clone();
    }
    let latest = resolver.latest_version(url).await;
    seen.insert(url.to_string(), latest.clone());
    latest
}

fn parse_modules(groups: &[ModuleGroup]) -> Vec<ParsedGroup> {
    let parser = ManifestParser::new();
    groups
        .iter()
        .map(|group| ParsedGroup {
            directory: group.directory.clone(),
            modules: group
                .modules
                .iter()
                .map(|module| ParsedModule {
                    name: module.name.clone(),
                    relative_path: module.relative_path.clone(),
                    dependencies: parser.parse_module(&module.manifest, &module.name),
                })
                .collect(),
        })
        .collect()
}

/// App-level references: root manifest, project file, lockfiles and build
/// settings, deduplicated by URL in that order
fn collect_app_dependencies(detected: &DetectedProject) -> (Vec<DependencyRecord>, Option<Strategy>) {
    let mut records = Vec::new();

    if let Some(manifest) = &detected.app_manifest {
        records.extend(
            ManifestParser::new()
                .parse(manifest)
                .into_iter()
                .filter(|r| !r.is_local),
        );
    }

    let mut strategy = None;
    if let Some(project_file) = &detected.project_file {
        let extraction = ProjectFileExtractor::new().extract(project_file);
        strategy = extraction.strategy;
        records.extend(extraction.records);
    }

    let lockfile_parser = LockfileParser::new();
    for lockfile in &detected.lockfiles {
        records.extend(lockfile_parser.parse(lockfile));
    }

    let settings_parser = BuildSettingsParser::new();
    for settings in &detected.build_settings {
        records.extend(settings_parser.parse(settings));
    }

    (dedup_by_url(records), strategy)
}

/// A pod checked against the trunk's latest version
#[derive(Debug, Clone)]
pub struct PodCheck {
    pub name: String,
    pub declared_version: Option<String>,
    /// Version pinned in `Podfile.lock`
    pub installed_version: Option<String>,
    pub latest: LatestVersion,
    pub status: Staleness,
}

impl PodCheck {
    pub fn new(pod: PodDeclaration, installed_version: Option<String>, latest: LatestVersion) -> Self {
        let status = Staleness::classify(installed_version.as_deref(), latest.as_version());
        Self {
            name: pod.name,
            declared_version: pod.declared_version,
            installed_version,
            latest,
            status,
        }
    }
}

/// Result of a full analysis run
#[derive(Debug, Clone)]
pub struct Analysis {
    pub module_groups: Vec<ParsedGroup>,
    /// Canonical module dependencies with their latest versions
    pub dependencies: Vec<DependencyCheck>,
    pub conflicts: Vec<ConflictRecord>,
    pub app_dependencies: Vec<DependencyCheck>,
    pub app_strategy: Option<Strategy>,
    pub pods: Vec<PodCheck>,
}

impl Analysis {
    pub fn module_count(&self) -> usize {
        self.module_groups.iter().map(|g| g.modules.len()).sum()
    }

    pub fn outdated_count(&self) -> usize {
        self.dependencies
            .iter()
            .chain(&self.app_dependencies)
            .filter(|c| c.is_outdated())
            .count()
            + self
                .pods
                .iter()
                .filter(|p| matches!(p.status, Staleness::MajorBehind | Staleness::MinorBehind))
                .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::VersionCache;
    use crate::detector::ProjectDetector;
    use crate::hosts::{CocoaPodsClient, GitHubClient, GitLabClient};
    use crate::resolver::ResolveMode;
    use scu_core::SourceKind;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;
    use wiremock::MockServer;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, content).expect("write fixture");
    }

    fn manifest(deps: &[&str]) -> String {
        format!(
            "// swift-tools-version:5.9\nimport PackageDescription\n\nlet package = Package(\n    name: \"M\",\n    dependencies: [\n{}\n    ]\n)\n",
            deps.iter()
                .map(|d| format!("        {d},"))
                .collect::<Vec<_>>()
                .join("\n")
        )
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().expect("tempdir");
        let root = dir.path();
        write(
            root,
            "Modules/Core/Package.swift",
            &manifest(&[
                r#".package(url: "https://github.com/Alamofire/Alamofire.git", from: "5.8.0")"#,
                r#".package(path: "../Shared")"#,
            ]),
        );
        write(
            root,
            "Modules/Feature/Package.swift",
            &manifest(&[
                r#".package(url: "https://github.com/Alamofire/Alamofire.git", exact: "5.6.0")"#,
                r#".package(url: "https://github.com/onevcat/Kingfisher.git", from: "7.10.0")"#,
            ]),
        );
        write(
            root,
            "App.xcodeproj/project.pbxproj",
            r#"
/* Begin XCRemoteSwiftPackageReference section */
		AA11 /* XCRemoteSwiftPackageReference "SnapKit" */ = {
			isa = XCRemoteSwiftPackageReference;
			repositoryURL = "https://github.com/SnapKit/SnapKit.git";
			requirement = {
				kind = upToNextMajorVersion;
				minimumVersion = 5.6.0;
			};
		};
/* End XCRemoteSwiftPackageReference section */
"#,
        );
        write(
            root,
            "App.xcodeproj/project.xcworkspace/xcshareddata/swiftpm/Package.resolved",
            r#"{ "pins": [
                { "identity": "snapkit", "location": "https://github.com/SnapKit/SnapKit.git", "state": { "version": "5.7.1" } },
                { "identity": "lottie", "location": "https://github.com/airbnb/lottie-ios.git", "state": { "version": "4.4.0" } }
            ], "version": 2 }"#,
        );
        write(root, "Podfile", "target 'App' do\n  pod 'Firebase/Analytics'\nend\n");
        write(root, "Podfile.lock", "PODS:\n  - Firebase/Analytics (10.18.0)\n");
        dir
    }

    #[test]
    fn test_collect_inventory() {
        let dir = fixture();
        let detected = ProjectDetector::new(dir.path().to_path_buf()).detect();
        let inventory = Inventory::collect(&detected);

        assert_eq!(inventory.module_count(), 2);

        // First declaration wins for the canonical set
        let names: Vec<&str> = inventory.canonical.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alamofire", "Kingfisher"]);
        assert_eq!(
            inventory
                .canonical
                .get("Alamofire")
                .and_then(|r| r.version_spec.as_deref()),
            Some("5.8.0")
        );

        assert_eq!(inventory.conflicts.len(), 1);
        assert_eq!(inventory.conflicts[0].package_name, "Alamofire");

        // Project file wins over the lockfile for the same URL
        let app: Vec<(&str, Option<&str>, SourceKind)> = inventory
            .app_dependencies
            .iter()
            .map(|r| (r.name.as_str(), r.version_spec.as_deref(), r.source_kind))
            .collect();
        assert_eq!(
            app,
            vec![
                ("SnapKit", Some("~> 5.6.0"), SourceKind::ProjectFile),
                ("lottie", Some("4.4.0"), SourceKind::Lockfile),
            ]
        );
        assert_eq!(inventory.app_strategy, Some(Strategy::Section));

        assert_eq!(inventory.pods.len(), 1);
        assert_eq!(inventory.installed_pods.version_of("Firebase"), Some("10.18.0"));
        assert_eq!(inventory.lookup_count(), 5);
    }

    #[test]
    fn test_exact_version_classifies_alike_across_sources() {
        let url = "https://github.com/acme/Widget.git";
        let manifest = ManifestParser::new()
            .parse_content(&format!(r#".package(url: "{url}", exact: "2.1.0")"#));
        let lockfile = LockfileParser::new().parse_content(&format!(
            r#"{{ "pins": [ {{ "identity": "widget", "location": "{url}", "state": {{ "version": "2.1.0" }} }} ], "version": 2 }}"#
        ));
        let project = ProjectFileExtractor::new().extract_content(&format!(
            "isa = XCRemoteSwiftPackageReference;\n\t\t\trepositoryURL = \"{url}\";\n\t\t\trequirement = {{\n\t\t\t\tkind = exactVersion;\n\t\t\t\tversion = \"2.1.0\";\n\t\t\t}};\n"
        ));

        let records: Vec<DependencyRecord> = manifest
            .into_iter()
            .chain(lockfile)
            .chain(project.records)
            .collect();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.version_spec.as_deref() == Some("2.1.0")));

        for latest in ["2.1.3", "2.4.0", "3.0.0"] {
            let statuses: Vec<Staleness> = records
                .iter()
                .map(|r| DependencyCheck::new(r.clone(), LatestVersion::Found(latest.into())).status)
                .collect();
            assert!(
                statuses.iter().all(|s| *s == statuses[0]),
                "sources disagree for latest {latest}: {statuses:?}"
            );
        }
        let check = DependencyCheck::new(records[2].clone(), LatestVersion::Found("2.4.0".into()));
        assert_eq!(check.status, Staleness::MinorBehind);
    }

    #[tokio::test]
    async fn test_resolve_cache_only() {
        let dir = fixture();
        let detected = ProjectDetector::new(dir.path().to_path_buf()).detect();
        let inventory = Inventory::collect(&detected);

        let cache_path = dir.path().join("results/version_cache.json");
        write(
            dir.path(),
            "results/version_cache.json",
            r#"{
                "https://github.com/Alamofire/Alamofire.git": { "version": "5.9.1", "timestamp": "2020-01-01T00:00:00" },
                "cocoapods:Firebase": { "version": "11.0.0", "timestamp": "2020-01-01T00:00:00Z" }
            }"#,
        );

        let server = MockServer::start().await;
        let mut resolver = VersionResolver::with_clients(
            ResolveMode::CacheOnly,
            VersionCache::open(&cache_path),
            GitHubClient::new(None).with_base_url(server.uri()),
            GitLabClient::new(None).with_base_url(server.uri()),
            CocoaPodsClient::new().with_base_url(server.uri()),
        );

        let mut calls = Vec::new();
        let analysis = inventory
            .resolve(&mut resolver, |done, total| calls.push((done, total)))
            .await;

        assert_eq!(calls.last(), Some(&(5, 5)));

        let alamofire = &analysis.dependencies[0];
        assert_eq!(alamofire.latest, LatestVersion::Found("5.9.1".into()));
        assert_eq!(alamofire.status, Staleness::MinorBehind);

        let kingfisher = &analysis.dependencies[1];
        assert_eq!(kingfisher.latest, LatestVersion::NotCached);
        assert_eq!(kingfisher.status, Staleness::Undetermined);

        assert_eq!(analysis.pods[0].status, Staleness::MajorBehind);
        assert_eq!(analysis.outdated_count(), 2);
    }
}
