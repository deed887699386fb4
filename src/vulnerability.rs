use guardian_core::RawVulnerability;

use crate::severity::{self, ResolvedSeverity, Severity};

pub const MISSING_SUMMARY: &str = "No description available";

/// A vulnerability attached to the package identity it was queried for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VulnerabilityRecord {
    pub id: String,
    pub summary: String,
    pub severity: ResolvedSeverity,
    pub references: Vec<String>,
    pub package_name: String,
    pub version: String,
}

impl VulnerabilityRecord {
    pub fn tier(&self) -> Severity {
        self.severity.tier
    }
}

/// Converts lookup entries into records stamped with the queried name and version.
pub fn normalize(
    entries: Vec<RawVulnerability>,
    package_name: &str,
    version: &str,
) -> Vec<VulnerabilityRecord> {
    entries
        .into_iter()
        .map(|entry| {
            let severity = severity::resolve(entry.database_severity.as_deref(), &entry.scores);
            VulnerabilityRecord {
                id: entry.id,
                summary: entry
                    .summary
                    .filter(|summary| !summary.is_empty())
                    .unwrap_or_else(|| MISSING_SUMMARY.to_string()),
                severity,
                references: entry.references,
                package_name: package_name.to_string(),
                version: version.to_string(),
            }
        })
        .collect()
}
