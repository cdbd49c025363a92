//! Per-platform analysis results and fallback metadata

use serde::{Deserialize, Serialize};

use crate::finding::Vulnerability;

/// Analysis strategy that produced a result, ordered as the fallback ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackStrategy {
    Primary,
    AiOnly,
    BasicValidation,
    CachedResults,
    Minimal,
}

impl FallbackStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackStrategy::Primary => "primary",
            FallbackStrategy::AiOnly => "ai-only",
            FallbackStrategy::BasicValidation => "basic-validation",
            FallbackStrategy::CachedResults => "cached-results",
            FallbackStrategy::Minimal => "minimal",
        }
    }

    /// Position in the degradation ladder (primary first)
    pub fn tier_index(&self) -> u8 {
        match self {
            FallbackStrategy::Primary => 0,
            FallbackStrategy::AiOnly => 1,
            FallbackStrategy::BasicValidation => 2,
            FallbackStrategy::CachedResults => 3,
            FallbackStrategy::Minimal => 4,
        }
    }
}

impl std::fmt::Display for FallbackStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How much of the full analysis capability was actually delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationLevel {
    None,
    Partial,
    Significant,
    Minimal,
}

impl DegradationLevel {
    /// Monotonic rank: earlier ladder tiers map to lower ranks
    pub fn rank(&self) -> u8 {
        match self {
            DegradationLevel::None => 0,
            DegradationLevel::Partial => 1,
            DegradationLevel::Significant => 2,
            DegradationLevel::Minimal => 3,
        }
    }

    pub fn for_strategy(strategy: FallbackStrategy) -> Self {
        match strategy {
            FallbackStrategy::Primary => DegradationLevel::None,
            FallbackStrategy::AiOnly => DegradationLevel::Partial,
            FallbackStrategy::BasicValidation | FallbackStrategy::CachedResults => {
                DegradationLevel::Significant
            }
            FallbackStrategy::Minimal => DegradationLevel::Minimal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DegradationLevel::None => "none",
            DegradationLevel::Partial => "partial",
            DegradationLevel::Significant => "significant",
            DegradationLevel::Minimal => "minimal",
        }
    }
}

/// Platform-specific result metadata, populated when a result was produced
/// through the fallback ladder
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_strategy: Option<FallbackStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degradation_level: Option<DegradationLevel>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Output of one platform's analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub success: bool,
    pub vulnerabilities: Vec<Vulnerability>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub execution_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AnalysisMetadata>,
}

impl AnalysisResult {
    pub fn success(vulnerabilities: Vec<Vulnerability>, execution_time_ms: u64) -> Self {
        Self {
            success: true,
            vulnerabilities,
            errors: Vec::new(),
            warnings: Vec::new(),
            execution_time_ms,
            metadata: None,
        }
    }

    pub fn failure(errors: Vec<String>, execution_time_ms: u64) -> Self {
        Self {
            success: false,
            vulnerabilities: Vec::new(),
            errors,
            warnings: Vec::new(),
            execution_time_ms,
            metadata: None,
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Tag the result with the fallback strategy that produced it
    pub fn with_fallback_metadata(
        mut self,
        strategy: FallbackStrategy,
        degradation: DegradationLevel,
    ) -> Self {
        let metadata = self.metadata.get_or_insert_with(AnalysisMetadata::default);
        metadata.fallback_strategy = Some(strategy);
        metadata.degradation_level = Some(degradation);
        self
    }

    /// Merge another result fragment into this one (used when cached
    /// per-contract fragments are combined)
    pub fn merge(&mut self, other: AnalysisResult) {
        self.success = self.success && other.success;
        self.vulnerabilities.extend(other.vulnerabilities);
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.execution_time_ms += other.execution_time_ms;
    }

    pub fn critical_count(&self) -> usize {
        self.vulnerabilities
            .iter()
            .filter(|v| v.severity == crate::finding::Severity::Critical)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degradation_monotonic_with_tier_index() {
        let strategies = [
            FallbackStrategy::Primary,
            FallbackStrategy::AiOnly,
            FallbackStrategy::BasicValidation,
            FallbackStrategy::CachedResults,
            FallbackStrategy::Minimal,
        ];

        for pair in strategies.windows(2) {
            let earlier = DegradationLevel::for_strategy(pair[0]);
            let later = DegradationLevel::for_strategy(pair[1]);
            assert!(
                earlier.rank() <= later.rank(),
                "degradation must not decrease from {} to {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_merge_accumulates() {
        let mut a = AnalysisResult::success(vec![], 100);
        let b = AnalysisResult::failure(vec!["boom".to_string()], 50);

        a.merge(b);

        assert!(!a.success);
        assert_eq!(a.errors.len(), 1);
        assert_eq!(a.execution_time_ms, 150);
    }

    #[test]
    fn test_fallback_metadata_tagging() {
        let result = AnalysisResult::success(vec![], 10).with_fallback_metadata(
            FallbackStrategy::CachedResults,
            DegradationLevel::Significant,
        );

        let metadata = result.metadata.unwrap();
        assert_eq!(
            metadata.fallback_strategy,
            Some(FallbackStrategy::CachedResults)
        );
        assert_eq!(
            metadata.degradation_level,
            Some(DegradationLevel::Significant)
        );
    }
}
