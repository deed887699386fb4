use super::*;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use guardian_core::{Ecosystem, LookupError, RawVulnerability};

#[derive(Default)]
struct FixedLookup {
    responses: HashMap<(String, Ecosystem), Vec<RawVulnerability>>,
}

impl FixedLookup {
    fn with(mut self, package: &str, ecosystem: Ecosystem, label: &str) -> Self {
        self.responses.insert(
            (package.to_string(), ecosystem),
            vec![RawVulnerability {
                id: format!("OSV-{package}"),
                summary: Some(format!("{package} is vulnerable")),
                database_severity: Some(label.to_string()),
                ..RawVulnerability::default()
            }],
        );
        self
    }
}

#[async_trait]
impl VulnerabilityLookup for FixedLookup {
    async fn query(
        &self,
        package: &str,
        _version: &str,
        ecosystem: Ecosystem,
    ) -> Result<Vec<RawVulnerability>, LookupError> {
        Ok(self
            .responses
            .get(&(package.to_string(), ecosystem))
            .cloned()
            .unwrap_or_default())
    }
}

fn unique_project_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("guardian-service-{nanos}-{name}"));
    fs::create_dir_all(&dir).expect("create project dir");
    dir
}

fn write_manifests(dir: &Path, package_json: Option<&str>, composer_json: Option<&str>) {
    if let Some(contents) = package_json {
        fs::write(dir.join("package.json"), contents).expect("write package.json");
    }
    if let Some(contents) = composer_json {
        fs::write(dir.join("composer.json"), contents).expect("write composer.json");
    }
}

fn service(lookup: FixedLookup) -> GuardianService {
    GuardianService::with_lookup(GuardianConfig::default(), Arc::new(lookup))
}

fn path_str(dir: &Path) -> String {
    dir.to_string_lossy().into_owned()
}

#[test]
fn blank_project_path_resolves_to_current_dir() {
    let cwd = env::current_dir().expect("cwd");
    assert_eq!(resolve_project_dir(None).expect("none"), cwd);
    assert_eq!(resolve_project_dir(Some("   ")).expect("blank"), cwd);
    assert_eq!(
        resolve_project_dir(Some("/srv/app")).expect("explicit"),
        PathBuf::from("/srv/app")
    );
}

#[tokio::test]
async fn both_manifests_are_reported_npm_first() {
    let dir = unique_project_dir("both");
    write_manifests(
        &dir,
        Some(r#"{"dependencies": {"lodash": "^4.17.20"}}"#),
        Some(r#"{"require": {"php": ">=8.1", "guzzlehttp/guzzle": "^7.0"}}"#),
    );
    let lookup = FixedLookup::default()
        .with("lodash", Ecosystem::Npm, "HIGH")
        .with("guzzlehttp/guzzle", Ecosystem::Packagist, "CRITICAL");

    let report = service(lookup)
        .check_vulnerabilities(Some(&path_str(&dir)), FileType::Both, ScanMode::Full)
        .await
        .expect("scan");
    let _ = fs::remove_dir_all(&dir);

    let npm = report
        .find("# Security Scan Results (package.json)")
        .expect("npm section");
    let composer = report
        .find("# Security Scan Results (composer.json)")
        .expect("composer section");
    assert!(npm < composer);
    assert!(report.contains("## 🔴 lodash@4.17.20"));
    assert!(report.contains("## 🔴 guzzlehttp/guzzle@7.0"));
    assert!(report.contains("composer update"));
    assert!(!report.contains("php@"));
}

#[tokio::test]
async fn sections_are_joined_with_a_blank_line() {
    let dir = unique_project_dir("join");

    let report = service(FixedLookup::default())
        .check_vulnerabilities(Some(&path_str(&dir)), FileType::Both, ScanMode::Full)
        .await
        .expect("scan");
    let _ = fs::remove_dir_all(&dir);

    assert_eq!(
        report,
        "❌ package.json file not found in this directory.\n\n\
         ❌ composer.json file not found in this directory."
    );
}

#[tokio::test]
async fn missing_manifest_does_not_stop_the_other_scan() {
    let dir = unique_project_dir("one-missing");
    write_manifests(&dir, None, Some(r#"{"require": {"monolog/monolog": "2.9.1"}}"#));

    let report = service(FixedLookup::default())
        .check_vulnerabilities(Some(&path_str(&dir)), FileType::Both, ScanMode::Summary)
        .await
        .expect("scan");
    let _ = fs::remove_dir_all(&dir);

    assert!(report.starts_with("❌ package.json file not found in this directory."));
    assert!(report.contains("# Security Scan Results (composer.json)"));
    assert!(report.contains("No known security vulnerabilities found"));
}

#[tokio::test]
async fn file_type_selects_a_single_manifest() {
    let dir = unique_project_dir("select");
    write_manifests(
        &dir,
        Some(r#"{"dependencies": {"lodash": "4.17.20"}}"#),
        Some(r#"{"require": {"monolog/monolog": "2.9.1"}}"#),
    );
    let service = service(FixedLookup::default());

    let npm_only = service
        .check_vulnerabilities(Some(&path_str(&dir)), FileType::PackageJson, ScanMode::Full)
        .await
        .expect("npm scan");
    let composer_only = service
        .check_vulnerabilities(Some(&path_str(&dir)), FileType::ComposerJson, ScanMode::Full)
        .await
        .expect("composer scan");
    let _ = fs::remove_dir_all(&dir);

    assert!(npm_only.contains("(package.json)"));
    assert!(!npm_only.contains("composer.json"));
    assert!(composer_only.contains("(composer.json)"));
    assert!(!composer_only.contains("package.json"));
}

#[tokio::test]
async fn malformed_manifest_fails_the_whole_invocation() {
    let dir = unique_project_dir("malformed");
    write_manifests(&dir, Some("{ not json"), Some(r#"{"require": {}}"#));

    let err = service(FixedLookup::default())
        .check_vulnerabilities(Some(&path_str(&dir)), FileType::Both, ScanMode::Full)
        .await
        .expect_err("malformed manifest");
    let _ = fs::remove_dir_all(&dir);

    assert!(format!("{err:#}").contains("failed to scan package.json"));
}
