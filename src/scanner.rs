//! Per-manifest scan: dependency lookups, tier aggregation, and report assembly.

use std::path::Path;

use anyhow::Context;
use futures::stream::{self, StreamExt};
use guardian_core::{DependencySpec, Ecosystem, LookupError, ManifestParser, VulnerabilityLookup};

use crate::report;
use crate::severity::SeverityCounts;
use crate::types::ScanMode;
use crate::vulnerability::{self, VulnerabilityRecord};

const VERSION_OPERATORS: &[char] = &['^', '~', '>', '=', '<'];

/// Tuning for the lookup phase of a scan.
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    /// Maximum number of lookups in flight; `1` keeps lookups strictly sequential.
    pub max_concurrent_lookups: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: 1,
        }
    }
}

/// Vulnerabilities found for one declared dependency.
#[derive(Debug, Clone)]
pub struct PackageFindings {
    pub package_name: String,
    pub version: String,
    pub records: Vec<VulnerabilityRecord>,
}

/// Result of one dependency lookup after failures have been absorbed.
#[derive(Debug)]
pub enum LookupOutcome {
    Clean,
    Vulnerable(Vec<VulnerabilityRecord>),
    Failed(LookupError),
}

/// State owned by a single manifest scan.
#[derive(Debug, Default)]
pub struct ScanAccumulator {
    counts: SeverityCounts,
    findings: Vec<PackageFindings>,
    failed_lookups: usize,
}

impl ScanAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, dependency: &DependencySpec, version: &str, outcome: LookupOutcome) {
        match outcome {
            LookupOutcome::Clean => {}
            LookupOutcome::Failed(_) => {
                self.failed_lookups = self.failed_lookups.saturating_add(1);
            }
            LookupOutcome::Vulnerable(records) => {
                for record in &records {
                    self.counts.record(record.tier());
                }
                self.findings.push(PackageFindings {
                    package_name: dependency.name.clone(),
                    version: version.to_string(),
                    records,
                });
            }
        }
    }

    pub fn counts(&self) -> &SeverityCounts {
        &self.counts
    }

    pub fn findings(&self) -> &[PackageFindings] {
        &self.findings
    }

    pub fn failed_lookups(&self) -> usize {
        self.failed_lookups
    }

    /// Renders the report body that follows the title.
    pub fn render(&self, mode: ScanMode, update_command: &str) -> String {
        if mode == ScanMode::Summary {
            return report::render_summary_block(&self.counts);
        }

        let mut out = String::new();
        for finding in &self.findings {
            out.push_str(&report::format_vulnerabilities(
                &finding.records,
                &finding.package_name,
                &finding.version,
                mode,
                update_command,
            ));
        }
        out.push_str(&report::render_totals_block(&self.counts, mode));
        out
    }
}

/// Reduces a declared version constraint to the single version sent to the lookup.
///
/// Leading comparison operators (`^ ~ > = <` in any combination) and
/// surrounding whitespace are stripped: `"^2.3.1"` becomes `"2.3.1"`.
/// Operators after the first version are kept, so a compound range such as
/// `"1.0 <2.0"` is sent unchanged rather than collapsed to `"1.0 2.0"`.
pub fn representative_version(version_range: &str) -> &str {
    version_range
        .trim()
        .trim_start_matches(|ch: char| VERSION_OPERATORS.contains(&ch) || ch.is_whitespace())
        .trim_end()
}

/// Scans one manifest kind inside `project_dir` and renders its report.
///
/// A missing manifest renders a fixed message. Unreadable or malformed
/// manifests are returned as errors.
pub async fn scan_manifest(
    project_dir: &Path,
    manifest: &dyn ManifestParser,
    lookup: &dyn VulnerabilityLookup,
    mode: ScanMode,
    options: ScanOptions,
) -> anyhow::Result<String> {
    let file_name = manifest.file_name();
    let dependencies = match manifest.read_dependencies(project_dir) {
        Ok(dependencies) => dependencies,
        Err(err) if err.is_not_found() => {
            tracing::info!(manifest = file_name, "manifest not found; skipping");
            return Ok(report::not_found_message(file_name));
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to scan {file_name}"));
        }
    };

    let dependencies = dependencies
        .into_iter()
        .filter(|dependency| !manifest.is_platform_package(&dependency.name))
        .collect::<Vec<_>>();
    let ecosystem = manifest.ecosystem();
    let dependency_count = dependencies.len();

    // `buffered` yields in input order, so the report matches manifest order.
    let outcomes = stream::iter(dependencies)
        .map(|dependency| lookup_declared(lookup, dependency, ecosystem))
        .buffered(options.max_concurrent_lookups.max(1))
        .collect::<Vec<_>>()
        .await;

    let mut accumulator = ScanAccumulator::new();
    for (dependency, version, outcome) in outcomes {
        accumulator.record(&dependency, &version, outcome);
    }

    tracing::info!(
        manifest = file_name,
        dependencies = dependency_count,
        vulnerable_packages = accumulator.findings().len(),
        vulnerabilities = accumulator.counts().total(),
        failed_lookups = accumulator.failed_lookups(),
        "manifest scan finished"
    );

    let mut out = report::title(file_name);
    out.push_str(&accumulator.render(mode, manifest.update_command()));
    Ok(out)
}

async fn lookup_declared(
    lookup: &dyn VulnerabilityLookup,
    dependency: DependencySpec,
    ecosystem: Ecosystem,
) -> (DependencySpec, String, LookupOutcome) {
    let version = representative_version(&dependency.version_range).to_string();
    let outcome = lookup_dependency(lookup, &dependency.name, &version, ecosystem).await;
    (dependency, version, outcome)
}

async fn lookup_dependency(
    lookup: &dyn VulnerabilityLookup,
    package_name: &str,
    version: &str,
    ecosystem: Ecosystem,
) -> LookupOutcome {
    match lookup.query(package_name, version, ecosystem).await {
        Ok(entries) if entries.is_empty() => LookupOutcome::Clean,
        Ok(entries) => {
            LookupOutcome::Vulnerable(vulnerability::normalize(entries, package_name, version))
        }
        Err(err) => {
            tracing::warn!(
                package = package_name,
                version,
                ecosystem = ecosystem.osv_name(),
                "vulnerability lookup failed, treating as no known vulnerabilities: {err}"
            );
            LookupOutcome::Failed(err)
        }
    }
}

#[cfg(test)]
#[path = "tests/scanner.rs"]
mod tests;
