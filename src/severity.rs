//! Severity tier resolution and per-tier counting.

use guardian_core::SeverityScore;

/// Scoring scheme whose numeric score is mapped onto tiers.
pub const CVSS_V3_SCHEME: &str = "CVSS_V3";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Critical,
    High,
    Moderate,
    Low,
    Unknown,
}

impl Severity {
    /// Classifies a free-form label by case-insensitive substring match.
    ///
    /// Matching is intentionally loose: `"NOT_CRITICAL"` is still critical.
    pub fn from_label(label: &str) -> Self {
        let label = label.to_ascii_uppercase();
        if label.contains("CRITICAL") {
            Self::Critical
        } else if label.contains("HIGH") {
            Self::High
        } else if label.contains("MODERATE") {
            Self::Moderate
        } else if label.contains("LOW") {
            Self::Low
        } else {
            Self::Unknown
        }
    }

    pub fn from_cvss_score(score: f64) -> Self {
        if score >= 9.0 {
            Self::Critical
        } else if score >= 7.0 {
            Self::High
        } else if score >= 4.0 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Moderate => "MODERATE",
            Self::Low => "LOW",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn is_critical_or_high(self) -> bool {
        matches!(self, Self::Critical | Self::High)
    }
}

/// A severity as shown to the user plus the tier it counts towards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSeverity {
    /// Upstream label verbatim, or the tier name when derived from a score.
    pub label: String,
    pub tier: Severity,
}

impl ResolvedSeverity {
    fn from_tier(tier: Severity) -> Self {
        Self {
            label: tier.label().to_string(),
            tier,
        }
    }
}

/// Resolves the severity of one vulnerability entry.
///
/// An explicit database label wins; otherwise the first `CVSS_V3` score is
/// mapped by threshold; otherwise the severity is unknown. Never fails.
pub fn resolve(database_label: Option<&str>, scores: &[SeverityScore]) -> ResolvedSeverity {
    if let Some(label) = database_label.filter(|label| !label.is_empty()) {
        return ResolvedSeverity {
            label: label.to_string(),
            tier: Severity::from_label(label),
        };
    }

    if let Some(entry) = scores.iter().find(|entry| entry.scheme == CVSS_V3_SCHEME) {
        let base = entry.score.split('/').next().unwrap_or_default();
        return ResolvedSeverity::from_tier(Severity::from_cvss_score(leading_number(base)));
    }

    ResolvedSeverity::from_tier(Severity::Unknown)
}

/// Parses the leading decimal number of `raw`, or `0.0` when there is none.
fn leading_number(raw: &str) -> f64 {
    let trimmed = raw.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    for (index, ch) in trimmed.char_indices() {
        match ch {
            '+' | '-' if index == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = index + ch.len_utf8();
    }

    if !seen_digit {
        return 0.0;
    }
    trimmed[..end]
        .trim_end_matches('.')
        .parse::<f64>()
        .unwrap_or(0.0)
}

/// Vulnerability counts per tier. Low also absorbs unknown severities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub moderate: usize,
    pub low: usize,
}

impl SeverityCounts {
    pub fn record(&mut self, tier: Severity) {
        let slot = match tier {
            Severity::Critical => &mut self.critical,
            Severity::High => &mut self.high,
            Severity::Moderate => &mut self.moderate,
            Severity::Low | Severity::Unknown => &mut self.low,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.moderate + self.low
    }

    /// Moderate and low findings, which `critical-high-only` mode does not detail.
    pub fn moderate_or_low(&self) -> usize {
        self.moderate + self.low
    }
}
