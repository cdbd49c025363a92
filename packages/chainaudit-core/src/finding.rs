//! Vulnerability finding types
//!
//! Core types for platform-scoped security findings: severity, confidence,
//! source location and analysis origin.

use serde::{Deserialize, Serialize};

use crate::platform::PlatformId;

/// Finding severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    #[default]
    Medium,
    Low,
    Informational,
}

impl Severity {
    /// Sort weight, highest severity first (critical=4 ... informational=0)
    pub fn weight(&self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Informational => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Informational => "informational",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(Severity::Critical),
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            "informational" | "info" => Some(Severity::Informational),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a finding came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisOrigin {
    Static,
    Ai,
    Combined,
}

impl AnalysisOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisOrigin::Static => "static",
            AnalysisOrigin::Ai => "ai",
            AnalysisOrigin::Combined => "combined",
        }
    }
}

/// Confidence score clamped to [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Confidence(f64);

impl Confidence {
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Location of a finding in contract source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: Option<u32>,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column: None,
        }
    }

    pub fn with_column(mut self, column: u32) -> Self {
        self.column = Some(column);
        self
    }
}

/// Platform-scoped security finding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vulnerability {
    /// Type tag, e.g. "reentrancy", "unchecked-cpi", "validation-error"
    pub vuln_type: String,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub location: Location,
    pub recommendation: String,
    pub confidence: Confidence,
    pub origin: AnalysisOrigin,
    pub platform: PlatformId,
}

impl Vulnerability {
    /// Case-insensitive match of any keyword against type, title and description
    pub fn matches_any_keyword(&self, keywords: &[&str]) -> bool {
        let haystack = format!(
            "{} {} {}",
            self.vuln_type, self.title, self.description
        )
        .to_lowercase();
        keywords.iter().any(|kw| haystack.contains(kw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(vuln_type: &str, severity: Severity) -> Vulnerability {
        Vulnerability {
            vuln_type: vuln_type.to_string(),
            severity,
            title: "Test finding".to_string(),
            description: "A test finding".to_string(),
            location: Location::new("contract.sol", 10),
            recommendation: "Fix it".to_string(),
            confidence: Confidence::new(0.9),
            origin: AnalysisOrigin::Static,
            platform: PlatformId::new("ethereum"),
        }
    }

    #[test]
    fn test_severity_weights_descend() {
        assert!(Severity::Critical.weight() > Severity::High.weight());
        assert!(Severity::High.weight() > Severity::Medium.weight());
        assert!(Severity::Medium.weight() > Severity::Low.weight());
        assert!(Severity::Low.weight() > Severity::Informational.weight());
    }

    #[test]
    fn test_severity_roundtrip() {
        for severity in &[
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
            Severity::Informational,
        ] {
            assert_eq!(Severity::from_str(severity.as_str()), Some(*severity));
        }
    }

    #[test]
    fn test_confidence_clamped() {
        assert_eq!(Confidence::new(1.5).value(), 1.0);
        assert_eq!(Confidence::new(-0.2).value(), 0.0);
        assert_eq!(Confidence::new(0.75).value(), 0.75);
    }

    #[test]
    fn test_keyword_matching() {
        let f = finding("bridge-lock-bypass", Severity::High);
        assert!(f.matches_any_keyword(&["lock", "mint"]));
        assert!(!f.matches_any_keyword(&["governance"]));
    }
}
