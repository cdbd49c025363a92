//! Cross-platform risk report types
//!
//! Derived, read-only outputs of the risk aggregator. Never persisted
//! independently of the owning run's cross-platform result.

use serde::{Deserialize, Serialize};

use crate::finding::Severity;
use crate::platform::PlatformId;

/// Bridge security assessment: three sub-dimension scores starting at 100
/// with penalties per matched high/critical finding, floored at 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeSecurityAssessment {
    pub overall_score: f64,
    pub locking_score: f64,
    pub message_passing_score: f64,
    pub validator_set_score: f64,
    /// Platforms whose results looked bridge-like
    pub bridge_platforms: Vec<PlatformId>,
}

impl BridgeSecurityAssessment {
    /// Assessment when no bridge-like contracts were identified
    pub fn none_found() -> Self {
        Self {
            overall_score: 0.0,
            locking_score: 0.0,
            message_passing_score: 0.0,
            validator_set_score: 0.0,
            bridge_platforms: Vec::new(),
        }
    }
}

/// One asymmetry between two platforms' state-related finding types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyIssue {
    /// Finding type present on one platform and absent on the other
    pub issue_type: String,
    pub present_on: PlatformId,
    pub missing_on: PlatformId,
    /// Fixed risk weight in [0, 1]
    pub risk: f64,
    pub description: String,
}

/// State consistency analysis across all successful platform pairs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateConsistencyReport {
    pub issues: Vec<ConsistencyIssue>,
    /// Issues whose risk exceeds the configured threshold
    pub potential_inconsistencies: Vec<ConsistencyIssue>,
}

/// Interoperability risk derived from the platform combination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteroperabilityRisk {
    /// Stable risk type tag, e.g. "transaction-model-mismatch"
    pub risk_type: String,
    pub severity: Severity,
    pub description: String,
    pub affected_platforms: Vec<PlatformId>,
    pub mitigation: String,
}

/// Recommendation priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationPriority {
    High,
    Medium,
    Low,
}

impl RecommendationPriority {
    pub fn weight(&self) -> u8 {
        match self {
            RecommendationPriority::High => 3,
            RecommendationPriority::Medium => 2,
            RecommendationPriority::Low => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationPriority::High => "high",
            RecommendationPriority::Medium => "medium",
            RecommendationPriority::Low => "low",
        }
    }
}

/// Cross-chain deployment recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossChainRecommendation {
    pub priority: RecommendationPriority,
    pub text: String,
    /// Set when the recommendation targets one platform specifically
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<PlatformId>,
}

impl CrossChainRecommendation {
    pub fn general(priority: RecommendationPriority, text: impl Into<String>) -> Self {
        Self {
            priority,
            text: text.into(),
            platform: None,
        }
    }

    pub fn for_platform(
        priority: RecommendationPriority,
        platform: PlatformId,
        text: impl Into<String>,
    ) -> Self {
        Self {
            priority,
            text: text.into(),
            platform: Some(platform),
        }
    }
}

/// Synthesized cross-platform result attached to a completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossPlatformResult {
    pub bridge_security: BridgeSecurityAssessment,
    pub state_consistency: StateConsistencyReport,
    pub risks: Vec<InteroperabilityRisk>,
    pub recommendations: Vec<CrossChainRecommendation>,
}
