mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn scu() -> Command {
    Command::cargo_bin("scu").expect("scu binary")
}

/// Test that --help flag works
#[test]
fn test_help_flag() {
    scu()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Check for outdated Swift Package Manager"))
        .stdout(predicate::str::contains("--cached"))
        .stdout(predicate::str::contains("--output-dir"))
        .stdout(predicate::str::contains("--json"));
}

/// Test that --version flag works
#[test]
fn test_version_flag() {
    scu()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("scu"));
}

#[test]
fn test_nonexistent_path_fails() {
    let project = common::FixtureProject::empty();

    scu()
        .arg(project.join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_file_path_fails() {
    let project = common::FixtureProject::empty().with("Podfile", "");

    scu()
        .arg(project.join("Podfile"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a directory"));
}

/// Cache-only run over a project with nothing cached
#[test]
fn test_cached_run_writes_report() {
    let project = common::modular_project();
    let results = project.join("out");

    scu()
        .arg(project.root())
        .arg("--cached")
        .arg("--no-color")
        .arg("--output-dir")
        .arg(&results)
        .assert()
        .success()
        .stdout(predicate::str::contains("Module dependencies"))
        .stdout(predicate::str::contains("Alamofire"))
        .stdout(predicate::str::contains("N/A (cache)"))
        .stdout(predicate::str::contains("Conflicting versions:"))
        .stdout(predicate::str::contains("SwiftLint"))
        .stdout(predicate::str::contains("Report written to"));

    let reports: Vec<_> = fs::read_dir(&results)
        .expect("results directory")
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("dependency_report_"))
        .collect();
    assert_eq!(reports.len(), 1);
}

#[test]
fn test_json_output_uses_cached_versions() {
    let project = common::modular_project().with(
        "cache/versions.json",
        r#"{
  "https://github.com/Alamofire/Alamofire.git": { "version": "5.9.1", "timestamp": "2020-01-01T00:00:00Z" },
  "https://github.com/SnapKit/SnapKit.git": { "version": "5.7.1", "timestamp": "2020-01-01T00:00:00" }
}"#,
    );
    let cache = project.join("cache/versions.json");

    let output = scu()
        .arg(project.root())
        .arg("--cached")
        .arg("--json")
        .arg("--output-dir")
        .arg(project.join("out"))
        .arg("--cache-file")
        .arg(&cache)
        .output()
        .expect("run scu");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(report["project_name"], "Shop");
    assert_eq!(report["mode"], "cache_only");
    assert_eq!(report["statistics"]["total_modules"], 2);
    assert_eq!(report["statistics"]["total_unique_dependencies"], 2);
    assert_eq!(report["statistics"]["total_conflicts"], 1);

    let alamofire = &report["dependencies"][0];
    assert_eq!(alamofire["name"], "Alamofire");
    assert_eq!(alamofire["latest_version"], "5.9.1");
    assert_eq!(alamofire["status"], "🟡");

    let kingfisher = &report["dependencies"][1];
    assert_eq!(kingfisher["latest_version"], "N/A (cache)");

    let snapkit = &report["app_dependencies"][0];
    assert_eq!(snapkit["version"], "~> 5.6.0");
    assert_eq!(snapkit["latest_version"], "5.7.1");
    assert_eq!(report["app_extraction_strategy"], "section");

    assert_eq!(report["pods"][0]["version"], "0.54.0");
}

#[test]
fn test_empty_project_succeeds() {
    let project = common::FixtureProject::empty();

    scu()
        .arg(project.root())
        .arg("--cached")
        .arg("--no-color")
        .arg("--output-dir")
        .arg(project.join("out"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No dependencies found"));
}
