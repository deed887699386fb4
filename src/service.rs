//! Shared application service for dependency vulnerability scans.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use guardian_core::{ManifestParser, VulnerabilityLookup};
use guardian_osv::OsvClient;

use crate::config::GuardianConfig;
use crate::scanner;
use crate::types::{FileType, ScanMode};

const SECTION_SEPARATOR: &str = "\n\n";

/// Core runtime service shared by the MCP server and the CLI.
#[derive(Clone)]
pub struct GuardianService {
    config: Arc<GuardianConfig>,
    lookup: Arc<dyn VulnerabilityLookup>,
    manifests: Vec<Arc<dyn ManifestParser>>,
}

impl GuardianService {
    /// Creates a service using layered config and the OSV lookup client.
    ///
    /// # Errors
    ///
    /// Returns an error if config loading or HTTP client construction fails.
    pub fn new() -> anyhow::Result<Self> {
        let config = GuardianConfig::load()?;
        let client = OsvClient::new(config.osv.api_url.clone(), config.osv.timeout())
            .context("failed to build OSV client")?;
        tracing::debug!(api_url = client.api_url(), "using OSV endpoint");
        Ok(Self::with_lookup(config, Arc::new(client)))
    }

    /// Creates a service around an arbitrary lookup backend.
    pub fn with_lookup(config: GuardianConfig, lookup: Arc<dyn VulnerabilityLookup>) -> Self {
        Self {
            config: Arc::new(config),
            lookup,
            manifests: default_manifests(),
        }
    }

    /// Scans the selected manifests in `project_path` and joins their reports.
    ///
    /// `package.json` always precedes `composer.json`. A missing or blank
    /// path scans the current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error when a present manifest cannot be read or parsed.
    pub async fn check_vulnerabilities(
        &self,
        project_path: Option<&str>,
        file_type: FileType,
        mode: ScanMode,
    ) -> anyhow::Result<String> {
        let project_dir = resolve_project_dir(project_path)?;
        let options = self.config.scan.options();
        tracing::debug!(
            project = %project_dir.display(),
            ?file_type,
            ?mode,
            "starting vulnerability scan"
        );

        let mut sections = Vec::new();
        for manifest in self
            .manifests
            .iter()
            .filter(|manifest| file_type.selects(manifest.file_name()))
        {
            let section = scanner::scan_manifest(
                &project_dir,
                manifest.as_ref(),
                self.lookup.as_ref(),
                mode,
                options,
            )
            .await?;
            sections.push(section);
        }

        Ok(sections.join(SECTION_SEPARATOR))
    }
}

fn default_manifests() -> Vec<Arc<dyn ManifestParser>> {
    vec![
        guardian_npm::create_parser(),
        guardian_composer::create_parser(),
    ]
}

fn resolve_project_dir(project_path: Option<&str>) -> anyhow::Result<PathBuf> {
    match project_path.map(str::trim).filter(|path| !path.is_empty()) {
        Some(path) => Ok(PathBuf::from(path)),
        None => env::current_dir().context("failed to resolve current working directory"),
    }
}

#[cfg(test)]
#[path = "tests/service.rs"]
mod tests;
