use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output detail level for a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ScanMode {
    /// Every vulnerability with details.
    #[default]
    Full,
    /// Severity counts only.
    Summary,
    /// Details for CRITICAL and HIGH only; counts still cover everything.
    CriticalHighOnly,
}

/// Which manifest files a scan covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum FileType {
    #[serde(rename = "package.json")]
    #[value(name = "package.json")]
    PackageJson,
    #[serde(rename = "composer.json")]
    #[value(name = "composer.json")]
    ComposerJson,
    #[default]
    #[serde(rename = "both")]
    #[value(name = "both")]
    Both,
}

impl ScanMode {
    pub const NAMES: &'static [&'static str] = &["full", "summary", "critical-high-only"];
}

impl FileType {
    pub const NAMES: &'static [&'static str] = &["package.json", "composer.json", "both"];

    pub fn selects(self, manifest_file: &str) -> bool {
        match self {
            Self::PackageJson => manifest_file == "package.json",
            Self::ComposerJson => manifest_file == "composer.json",
            Self::Both => true,
        }
    }
}
