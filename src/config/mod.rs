//! Configuration loading and merge logic for `guardian-mcp`.
//!
//! Global config and project-local config are merged with project values taking precedence.
//! `GUARDIAN_MCP_OSV_API_URL` overrides the configured OSV endpoint.

mod overlay;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use self::overlay::ConfigOverlay;
use crate::scanner::ScanOptions;

/// Default OSV single-package query endpoint.
pub const DEFAULT_OSV_API_URL: &str = guardian_osv::OSV_API_URL;
/// Default per-request timeout for vulnerability lookups.
pub const DEFAULT_OSV_TIMEOUT_SECONDS: u64 = 30;
/// Default number of lookups in flight per manifest scan.
pub const DEFAULT_MAX_CONCURRENT_LOOKUPS: usize = 1;

const OSV_API_URL_ENV: &str = "GUARDIAN_MCP_OSV_API_URL";

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GuardianConfig {
    /// Vulnerability database settings.
    pub osv: OsvConfig,
    /// Manifest scan settings.
    pub scan: ScanConfig,
}

/// OSV endpoint settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OsvConfig {
    /// Query endpoint URL.
    pub api_url: String,
    /// Timeout applied to each lookup request.
    pub timeout_seconds: u64,
}

/// Scan tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Upper bound on concurrent lookups; `1` keeps lookups sequential.
    pub max_concurrent_lookups: usize,
}

impl Default for OsvConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_OSV_API_URL.to_string(),
            timeout_seconds: DEFAULT_OSV_TIMEOUT_SECONDS,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: DEFAULT_MAX_CONCURRENT_LOOKUPS,
        }
    }
}

impl OsvConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl ScanConfig {
    pub fn options(&self) -> ScanOptions {
        ScanOptions {
            max_concurrent_lookups: self.max_concurrent_lookups,
        }
    }
}

impl GuardianConfig {
    /// Loads and merges global + project configuration from default paths.
    ///
    /// # Errors
    ///
    /// Returns an error if any discovered config file cannot be read or parsed.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_with_paths(global_config_path(), project_config_path())?;
        if let Some(api_url) = env::var(OSV_API_URL_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
        {
            config.osv.api_url = api_url;
        }
        Ok(config)
    }

    #[cfg(test)]
    fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        Self::load_with_paths(Some(path.to_path_buf()), None)
    }

    fn load_with_paths(global: Option<PathBuf>, project: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Some(path) = global {
            config.merge_from_path(&path)?;
        }
        if let Some(path) = project {
            config.merge_from_path(&path)?;
        }
        Ok(config)
    }

    fn merge_from_path(&mut self, path: &Path) -> anyhow::Result<()> {
        if !path.exists() {
            return Ok(());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file at {}", path.display()))?;
        let overlay: ConfigOverlay = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file at {}", path.display()))?;
        tracing::debug!(path = %path.display(), "applying config file");
        self.apply_overlay(overlay);
        Ok(())
    }

    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        if let Some(value) = overlay.osv {
            if let Some(api_url) = value.api_url.filter(|url| !url.trim().is_empty()) {
                self.osv.api_url = api_url;
            }
            if let Some(timeout_seconds) = value.timeout_seconds {
                self.osv.timeout_seconds =
                    sanitize_positive_u64(timeout_seconds, DEFAULT_OSV_TIMEOUT_SECONDS);
            }
        }
        if let Some(value) = overlay.scan
            && let Some(max_concurrent_lookups) = value.max_concurrent_lookups
        {
            self.scan.max_concurrent_lookups =
                sanitize_positive_usize(max_concurrent_lookups, DEFAULT_MAX_CONCURRENT_LOOKUPS);
        }
    }
}

fn global_config_path() -> Option<PathBuf> {
    if let Some(explicit) = env::var_os("GUARDIAN_MCP_CONFIG_GLOBAL_PATH") {
        return Some(PathBuf::from(explicit));
    }

    let home = env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)?;

    Some(home.join(".config").join("guardian-mcp").join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    if let Some(explicit) = env::var_os("GUARDIAN_MCP_CONFIG_PROJECT_PATH") {
        return Some(PathBuf::from(explicit));
    }

    let cwd = env::current_dir().ok()?;
    Some(cwd.join(".guardian-mcp.toml"))
}

fn sanitize_positive_u64(value: u64, fallback: u64) -> u64 {
    if value == 0 { fallback } else { value }
}

fn sanitize_positive_usize(value: usize, fallback: usize) -> usize {
    if value == 0 { fallback } else { value }
}

#[cfg(test)]
#[path = "../tests/config.rs"]
mod tests;
