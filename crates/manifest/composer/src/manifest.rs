use guardian_core::{
    DependencySpec, Ecosystem, ManifestError, ManifestParser, read_json_dependency_sections,
};
use std::path::Path;

const DEPENDENCY_SECTIONS: &[&str] = &["require", "require-dev"];

/// Composer platform requirements matched by exact name.
const PLATFORM_NAMES: &[&str] = &[
    "php",
    "hhvm",
    "composer",
    "composer-plugin-api",
    "composer-runtime-api",
];

/// Prefixes of Composer platform requirements (`php-64bit`, `ext-curl`, `lib-icu`).
const PLATFORM_PREFIXES: &[&str] = &["php-", "ext-", "lib-"];

#[derive(Debug, Clone, Default)]
pub struct ComposerJsonParser;

impl ComposerJsonParser {
    pub fn new() -> Self {
        Self
    }
}

impl ManifestParser for ComposerJsonParser {
    fn file_name(&self) -> &'static str {
        "composer.json"
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Packagist
    }

    fn update_command(&self) -> &'static str {
        "composer update"
    }

    fn is_platform_package(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        PLATFORM_NAMES.contains(&name.as_str())
            || PLATFORM_PREFIXES
                .iter()
                .any(|prefix| name.starts_with(prefix))
    }

    fn parse_dependencies(&self, path: &Path) -> Result<Vec<DependencySpec>, ManifestError> {
        read_json_dependency_sections(path, DEPENDENCY_SECTIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("guardian-composer-{nanos}-{name}"));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn reads_require_and_require_dev() {
        let dir = unique_temp_dir("deps");
        fs::write(
            dir.join("composer.json"),
            r#"{
                "name": "acme/app",
                "require": {"php": ">=8.1", "monolog/monolog": "^2.3", "ext-curl": "*"},
                "require-dev": {"phpunit/phpunit": "^10.0"}
            }"#,
        )
        .expect("write composer.json");

        let deps = ComposerJsonParser::new()
            .read_dependencies(&dir)
            .expect("parse composer.json");
        let names = deps.iter().map(|dep| dep.name.as_str()).collect::<Vec<_>>();
        assert_eq!(
            names,
            vec!["php", "monolog/monolog", "ext-curl", "phpunit/phpunit"]
        );

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn platform_packages_are_recognized() {
        let parser = ComposerJsonParser::new();
        assert!(parser.is_platform_package("php"));
        assert!(parser.is_platform_package("php-64bit"));
        assert!(parser.is_platform_package("ext-curl"));
        assert!(parser.is_platform_package("ext-mbstring"));
        assert!(parser.is_platform_package("lib-icu"));
        assert!(parser.is_platform_package("PHP"));
    }

    #[test]
    fn runtime_and_plugin_api_requirements_are_platform() {
        let parser = ComposerJsonParser::new();
        assert!(parser.is_platform_package("hhvm"));
        assert!(parser.is_platform_package("composer"));
        assert!(parser.is_platform_package("composer-plugin-api"));
        assert!(parser.is_platform_package("composer-runtime-api"));
        assert!(!parser.is_platform_package("composer/composer"));
        assert!(!parser.is_platform_package("composer/installers"));
    }

    #[test]
    fn vendor_packages_starting_with_php_are_not_platform() {
        let parser = ComposerJsonParser::new();
        assert!(!parser.is_platform_package("phpunit/phpunit"));
        assert!(!parser.is_platform_package("phpstan/phpstan"));
        assert!(!parser.is_platform_package("monolog/monolog"));
    }

    #[test]
    fn metadata_targets_packagist() {
        let parser = ComposerJsonParser::new();
        assert_eq!(parser.file_name(), "composer.json");
        assert_eq!(parser.ecosystem(), Ecosystem::Packagist);
        assert_eq!(parser.update_command(), "composer update");
    }
}
