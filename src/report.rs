//! Markdown rendering for scan reports.

use crate::severity::{Severity, SeverityCounts};
use crate::types::ScanMode;
use crate::vulnerability::VulnerabilityRecord;

/// Maximum number of reference links listed per vulnerability.
pub const REFERENCE_LIMIT: usize = 3;

pub const NO_VULNERABILITIES_MESSAGE: &str = "\n✅ **No known security vulnerabilities found!**\n";

const FULL_SCAN_HINT: &str = "Run with scan_mode=\"full\" for detailed information.\n";

pub fn title(manifest_file: &str) -> String {
    format!("# Security Scan Results ({manifest_file})\n\n")
}

pub fn not_found_message(manifest_file: &str) -> String {
    format!("❌ {manifest_file} file not found in this directory.")
}

/// Renders the detail sections for one package/version pair.
///
/// Returns an empty string when there is nothing to show. In
/// `critical-high-only` mode records below HIGH are skipped entirely.
pub fn format_vulnerabilities(
    records: &[VulnerabilityRecord],
    package_name: &str,
    version: &str,
    mode: ScanMode,
    update_command: &str,
) -> String {
    let mut out = String::new();

    for record in records {
        let tier = record.tier();
        if mode == ScanMode::CriticalHighOnly && !tier.is_critical_or_high() {
            continue;
        }

        out.push_str(&format!("\n## 🔴 {package_name}@{version}\n"));
        out.push_str(&format!("**Vulnerability ID:** {}\n", record.id));
        out.push_str(&format!("**Severity:** {}\n\n", record.severity.label));

        match tier {
            Severity::Critical => {
                out.push_str("### ⚠️ CRITICAL RISK!\n\n");
                out.push_str(&format!("**Description:**\n{}\n\n", record.summary));
                out.push_str("**IMMEDIATE ACTION REQUIRED:**\n");
                out.push_str("1. Update the package to a safe version:\n");
                out.push_str(&format!(
                    "   ```bash\n   {update_command} {package_name}\n   ```\n"
                ));
                out.push_str(
                    "2. If update doesn't help, find alternatives or pin version manually\n",
                );
                out.push_str("3. Check if your code uses the vulnerable functionality\n\n");
            }
            Severity::High => {
                out.push_str(&format!("**Issue:** {}\n\n", record.summary));
                out.push_str("**Recommendation:** Update package as soon as possible:\n");
                out.push_str(&format!("```bash\n{update_command} {package_name}\n```\n\n"));
            }
            Severity::Moderate | Severity::Low | Severity::Unknown => {
                if mode == ScanMode::Full {
                    out.push_str(&format!("**Issue:** {}\n\n", record.summary));
                    out.push_str("**Recommendation:** Consider updating when possible.\n\n");
                }
            }
        }

        if !record.references.is_empty() {
            out.push_str("**More information:**\n");
            for url in record.references.iter().take(REFERENCE_LIMIT) {
                out.push_str(&format!("- {url}\n"));
            }
            out.push('\n');
        }

        out.push_str("---\n");
    }

    out
}

/// Count-only block used by `summary` mode.
pub fn render_summary_block(counts: &SeverityCounts) -> String {
    if counts.total() == 0 {
        return NO_VULNERABILITIES_MESSAGE.to_string();
    }

    let mut out = String::from("## 📊 Summary\n");
    push_tier_lines(&mut out, counts, true);
    out.push_str(&format!(
        "\n**Total vulnerabilities found: {}**\n\n",
        counts.total()
    ));
    out.push_str(FULL_SCAN_HINT);
    out
}

/// Totals block closing a detailed (`full` or `critical-high-only`) report.
pub fn render_totals_block(counts: &SeverityCounts, mode: ScanMode) -> String {
    if counts.total() == 0 {
        return NO_VULNERABILITIES_MESSAGE.to_string();
    }

    let mut out = String::from("\n## 📊 Summary\n");
    if mode == ScanMode::CriticalHighOnly {
        push_tier_lines(&mut out, counts, false);
        let hidden = counts.moderate_or_low();
        if hidden > 0 {
            out.push_str(&format!(
                "\n_Also found {hidden} moderate/low severity issues (hidden in this mode)._\n"
            ));
            out.push_str("_Run with scan_mode=\"full\" to see all vulnerabilities._\n");
        }
    } else {
        push_tier_lines(&mut out, counts, true);
        out.push_str(&format!(
            "\n**Total vulnerabilities found: {}**\n",
            counts.total()
        ));
    }
    out
}

fn push_tier_lines(out: &mut String, counts: &SeverityCounts, include_lower_tiers: bool) {
    out.push_str(&format!("- 🔴 Critical: {}\n", counts.critical));
    out.push_str(&format!("- 🟠 High: {}\n", counts.high));
    if include_lower_tiers {
        out.push_str(&format!("- 🟡 Moderate: {}\n", counts.moderate));
        out.push_str(&format!("- 🟢 Low: {}\n", counts.low));
    }
}
