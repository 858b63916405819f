use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directories never searched for modules or projects
const IGNORED_DIRS: &[&str] = &[".git", "build", "DerivedData", "Pods", ".build", ".swiftpm"];

/// Group name for modules directly under the project root
pub const ROOT_GROUP: &str = "root";

const MANIFEST: &str = "Package.swift";
const LOCKFILE: &str = "Package.resolved";
const APP_DELEGATE: &str = "AppDelegate.swift";

/// A directory holding a `Package.swift`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLocation {
    pub name: String,
    /// Path relative to the project root
    pub relative_path: PathBuf,
    pub manifest: PathBuf,
}

/// Modules sharing a parent directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleGroup {
    pub directory: String,
    pub modules: Vec<ModuleLocation>,
}

/// Everything found in a project tree
#[derive(Debug, Clone, Default)]
pub struct DetectedProject {
    pub module_groups: Vec<ModuleGroup>,
    /// The app's main `.xcodeproj` bundle
    pub primary_project: Option<PathBuf>,
    /// `project.pbxproj` inside the primary project
    pub project_file: Option<PathBuf>,
    /// `Package.swift` at the project root
    pub app_manifest: Option<PathBuf>,
    pub lockfiles: Vec<PathBuf>,
    pub build_settings: Vec<PathBuf>,
    pub podfile: Option<PathBuf>,
    pub podfile_lock: Option<PathBuf>,
}

impl DetectedProject {
    pub fn module_count(&self) -> usize {
        self.module_groups.iter().map(|g| g.modules.len()).sum()
    }
}

/// Detects Swift packages, Xcode projects and CocoaPods files in a project
pub struct ProjectDetector {
    project_path: PathBuf,
}

fn is_ignored(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| IGNORED_DIRS.contains(&name))
}

fn is_xcodeproj(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "xcodeproj")
}

impl ProjectDetector {
    pub fn new(project_path: PathBuf) -> Self {
        Self { project_path }
    }

    pub fn detect(&self) -> DetectedProject {
        let primary_project = self.primary_project();
        let project_file = primary_project
            .as_ref()
            .map(|p| p.join("project.pbxproj"))
            .filter(|p| p.is_file());

        let app_manifest = Some(self.project_path.join(MANIFEST)).filter(|p| p.is_file());
        let podfile = Some(self.project_path.join("Podfile")).filter(|p| p.is_file());

        let detected = DetectedProject {
            module_groups: self.find_modules(),
            lockfiles: self.lockfiles(primary_project.as_deref()),
            build_settings: primary_project
                .as_deref()
                .map(build_settings_files)
                .unwrap_or_default(),
            podfile_lock: podfile.as_ref().and_then(|_| self.find_podfile_lock()),
            primary_project,
            project_file,
            app_manifest,
            podfile,
        };

        tracing::debug!(
            modules = detected.module_count(),
            groups = detected.module_groups.len(),
            lockfiles = detected.lockfiles.len(),
            "project scanned"
        );
        detected
    }

    /// Display name of the project root directory
    pub fn root_name(&self) -> String {
        self.project_path
            .canonicalize()
            .ok()
            .as_deref()
            .and_then(Path::file_name)
            .or_else(|| self.project_path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| ROOT_GROUP.to_string())
    }

    /// Every directory with a `Package.swift`, grouped by parent directory
    /// in walk order
    pub fn find_modules(&self) -> Vec<ModuleGroup> {
        let mut groups: Vec<ModuleGroup> = Vec::new();

        let walker = WalkDir::new(&self.project_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_ignored(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable path: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            let manifest = entry.path().join(MANIFEST);
            if !manifest.is_file() {
                continue;
            }

            let relative_path = entry
                .path()
                .strip_prefix(&self.project_path)
                .unwrap_or(entry.path())
                .to_path_buf();
            let name = if entry.depth() == 0 {
                self.root_name()
            } else {
                entry.file_name().to_string_lossy().into_owned()
            };
            let directory = match relative_path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => {
                    parent.to_string_lossy().into_owned()
                }
                _ => ROOT_GROUP.to_string(),
            };

            tracing::debug!("found module {name} in {directory}");
            let module = ModuleLocation {
                name,
                relative_path,
                manifest,
            };
            match groups.iter_mut().find(|g| g.directory == directory) {
                Some(group) => group.modules.push(module),
                None => groups.push(ModuleGroup {
                    directory,
                    modules: vec![module],
                }),
            }
        }

        groups
    }

    /// All `.xcodeproj` bundles, sorted by path
    pub fn find_xcodeprojs(&self) -> Vec<PathBuf> {
        let mut projects = Vec::new();
        let mut walker = WalkDir::new(&self.project_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_ignored(e));

        while let Some(entry) = walker.next() {
            let Ok(entry) = entry else { continue };
            if entry.file_type().is_dir() && is_xcodeproj(entry.path()) {
                projects.push(entry.path().to_path_buf());
                walker.skip_current_dir();
            }
        }
        projects.sort();
        projects
    }

    /// Pick the app's main project: the only one; else the one named after
    /// the root directory; else the one whose directory holds an
    /// `AppDelegate.swift`; else the first
    pub fn primary_project(&self) -> Option<PathBuf> {
        let projects = self.find_xcodeprojs();
        if projects.len() <= 1 {
            return projects.into_iter().next();
        }

        let root_name = self.root_name().to_lowercase();
        if let Some(named) = projects.iter().find(|p| {
            p.file_stem()
                .is_some_and(|stem| stem.to_string_lossy().to_lowercase() == root_name)
        }) {
            tracing::debug!("primary project by name: {}", named.display());
            return Some(named.clone());
        }

        if let Some(with_delegate) = projects
            .iter()
            .find(|p| p.parent().is_some_and(contains_app_delegate))
        {
            tracing::debug!("primary project by AppDelegate: {}", with_delegate.display());
            return Some(with_delegate.clone());
        }

        tracing::debug!("primary project ambiguous, using the first");
        projects.into_iter().next()
    }

    /// `Package.resolved` files at the root, in `.swiftpm/`, and in the
    /// primary project's shared workspace data
    pub fn lockfiles(&self, primary_project: Option<&Path>) -> Vec<PathBuf> {
        let mut candidates = vec![
            self.project_path.join(LOCKFILE),
            self.project_path.join(".swiftpm").join(LOCKFILE),
        ];
        if let Some(project) = primary_project {
            candidates.push(swiftpm_dir(project).join(LOCKFILE));
        }
        candidates.into_iter().filter(|p| p.is_file()).collect()
    }

    /// Nearest `Podfile.lock` at or above the project root
    pub fn find_podfile_lock(&self) -> Option<PathBuf> {
        let start = self
            .project_path
            .canonicalize()
            .unwrap_or_else(|_| self.project_path.clone());
        start
            .ancestors()
            .map(|dir| dir.join("Podfile.lock"))
            .find(|candidate| candidate.is_file())
    }
}

fn swiftpm_dir(project: &Path) -> PathBuf {
    project
        .join("project.xcworkspace")
        .join("xcshareddata")
        .join("swiftpm")
}

/// `.xcconfig` files in the primary project's SwiftPM configuration directory
fn build_settings_files(project: &Path) -> Vec<PathBuf> {
    let dir = swiftpm_dir(project).join("configuration");
    let pattern = format!(
        "{}/*.xcconfig",
        glob::Pattern::escape(&dir.to_string_lossy())
    );

    match glob::glob(&pattern) {
        Ok(paths) => {
            let mut files: Vec<PathBuf> = paths.flatten().collect();
            files.sort();
            files
        }
        Err(e) => {
            tracing::warn!("Invalid xcconfig pattern {pattern}: {e}");
            Vec::new()
        }
    }
}

fn contains_app_delegate(dir: &Path) -> bool {
    WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| !is_ignored(e))
        .flatten()
        .any(|e| e.file_type().is_file() && e.file_name() == APP_DELEGATE)
}
