#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// An iOS project tree laid out in a temporary directory
pub struct FixtureProject {
    root: TempDir,
}

impl FixtureProject {
    pub fn empty() -> Self {
        Self {
            root: TempDir::new().expect("fixture root"),
        }
    }

    /// Add a file, creating intermediate directories
    pub fn with(self, relative: &str, content: &str) -> Self {
        let target = self.join(relative);
        if let Some(dir) = target.parent() {
            fs::create_dir_all(dir).expect("fixture directories");
        }
        fs::write(&target, content).expect("fixture file");
        self
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn join(&self, relative: &str) -> PathBuf {
        self.root.path().join(relative)
    }
}

/// A `Package.swift` declaring the given `.package(...)` entries
pub fn package_swift(name: &str, packages: &[&str]) -> String {
    let entries: Vec<String> = packages.iter().map(|p| format!("        {p},")).collect();
    format!(
        r#"// swift-tools-version:5.9
import PackageDescription

let package = Package(
    name: "{name}",
    platforms: [.iOS(.v15)],
    dependencies: [
{}
    ],
    targets: [
        .target(name: "{name}")
    ]
)
"#,
        entries.join("\n")
    )
}

/// A `project.pbxproj` with one remote package reference section
pub fn sample_pbxproj() -> &'static str {
    r#"// !$*UTF8*$!
{
	archiveVersion = 1;
	objects = {

/* Begin XCRemoteSwiftPackageReference section */
		C0FFEE01 /* XCRemoteSwiftPackageReference "SnapKit" */ = {
			isa = XCRemoteSwiftPackageReference;
			repositoryURL = "https://github.com/SnapKit/SnapKit.git";
			requirement = {
				kind = upToNextMajorVersion;
				minimumVersion = 5.6.0;
			};
		};
		C0FFEE02 /* XCRemoteSwiftPackageReference "lottie-ios" */ = {
			isa = XCRemoteSwiftPackageReference;
			repositoryURL = "https://github.com/airbnb/lottie-ios";
			requirement = {
				kind = exactVersion;
				version = 4.4.0;
			};
		};
/* End XCRemoteSwiftPackageReference section */
	};
}
"#
}

/// Two feature modules, an app project and pods
pub fn modular_project() -> FixtureProject {
    FixtureProject::empty()
        .with(
            "Modules/Core/Package.swift",
            &package_swift(
                "Core",
                &[
                    r#".package(url: "https://github.com/Alamofire/Alamofire.git", from: "5.8.0")"#,
                    r#".package(path: "../Shared")"#,
                ],
            ),
        )
        .with(
            "Modules/Feature/Package.swift",
            &package_swift(
                "Feature",
                &[
                    r#".package(url: "https://github.com/Alamofire/Alamofire.git", exact: "5.6.0")"#,
                    r#".package(url: "https://github.com/onevcat/Kingfisher.git", from: "7.10.0")"#,
                ],
            ),
        )
        .with("Shop.xcodeproj/project.pbxproj", sample_pbxproj())
        .with("Podfile", "target 'Shop' do\n  pod 'SwiftLint', '~> 0.54'\nend\n")
        .with("Podfile.lock", "PODS:\n  - SwiftLint (0.54.0)\n\nCOCOAPODS: 1.14.3\n")
}
