//! Cross-platform risk aggregation
//!
//! Consumes the map of successful per-platform results and produces the
//! bridge-security assessment, state-consistency analysis, the
//! interoperability risk catalog and recommendations. Pure and total: any
//! subset of results may be absent or unsuccessful.
//!
//! Keyword lists are a starting configuration, not a contract; the tests
//! validate scoring/sorting policy rather than exact keyword sets.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use chainaudit_core::{
    AnalysisResult, BridgeSecurityAssessment, ConsistencyIssue, CrossChainRecommendation,
    CrossPlatformResult, ExecutionModel, InteroperabilityRisk, PlatformId, PlatformRegistry,
    RecommendationPriority, Severity, StateConsistencyReport,
};

const BRIDGE_KEYWORDS: &[&str] = &[
    "bridge",
    "lock",
    "mint",
    "burn",
    "cross-chain",
    "crosschain",
    "wrapped",
    "relay",
];
const LOCKING_KEYWORDS: &[&str] = &["lock", "unlock", "escrow", "vault", "deposit", "withdraw"];
const MESSAGE_KEYWORDS: &[&str] = &["message", "relay", "oracle", "proof", "signature", "verify"];
const VALIDATOR_KEYWORDS: &[&str] = &[
    "validator",
    "guardian",
    "multisig",
    "quorum",
    "committee",
    "signer",
];
const STATE_KEYWORDS: &[&str] = &["state", "storage", "balance", "accounting", "ledger", "nonce"];
const GOVERNANCE_KEYWORDS: &[&str] = &["governance", "admin", "upgrade", "owner", "timelock"];

/// Aggregator tuning values, exposed as configuration rather than
/// hard-coded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    pub high_penalty: f64,
    pub critical_penalty: f64,
    pub consistency_risk_weight: f64,
    pub inconsistency_threshold: f64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            high_penalty: 15.0,
            critical_penalty: 25.0,
            consistency_risk_weight: 0.6,
            inconsistency_threshold: 0.5,
        }
    }
}

/// Cross-platform risk aggregator
pub struct RiskAggregator {
    registry: PlatformRegistry,
    config: AggregatorConfig,
}

impl RiskAggregator {
    pub fn new(registry: PlatformRegistry, config: AggregatorConfig) -> Self {
        Self { registry, config }
    }

    /// Aggregate whatever successful results are present. Never fails.
    pub fn aggregate(
        &self,
        platform_results: &HashMap<PlatformId, AnalysisResult>,
    ) -> CrossPlatformResult {
        // BTreeMap for deterministic iteration order across platforms
        let successful: BTreeMap<&PlatformId, &AnalysisResult> = platform_results
            .iter()
            .filter(|(_, result)| result.success)
            .collect();

        debug!(platforms = successful.len(), "Aggregating cross-platform risks");

        let bridge_security = self.assess_bridge_security(&successful);
        let state_consistency = self.analyze_state_consistency(&successful);
        let risks = self.catalog_interoperability_risks(&successful);
        let recommendations = self.build_recommendations(&risks, &successful);

        CrossPlatformResult {
            bridge_security,
            state_consistency,
            risks,
            recommendations,
        }
    }

    /// Bridge security: identify bridge-like results, then score locking,
    /// message passing and validator sets from 100 down, floored at 0.
    fn assess_bridge_security(
        &self,
        results: &BTreeMap<&PlatformId, &AnalysisResult>,
    ) -> BridgeSecurityAssessment {
        let bridge_platforms: Vec<PlatformId> = results
            .iter()
            .filter(|(_, result)| {
                result
                    .vulnerabilities
                    .iter()
                    .any(|v| v.matches_any_keyword(BRIDGE_KEYWORDS))
            })
            .map(|(platform, _)| (*platform).clone())
            .collect();

        if bridge_platforms.is_empty() {
            return BridgeSecurityAssessment::none_found();
        }

        let mut locking_score: f64 = 100.0;
        let mut message_passing_score: f64 = 100.0;
        let mut validator_set_score: f64 = 100.0;

        for (platform, result) in results {
            if !bridge_platforms.contains(*platform) {
                continue;
            }
            for vulnerability in &result.vulnerabilities {
                let penalty = match vulnerability.severity {
                    Severity::Critical => self.config.critical_penalty,
                    Severity::High => self.config.high_penalty,
                    _ => continue,
                };

                if vulnerability.matches_any_keyword(LOCKING_KEYWORDS) {
                    locking_score = (locking_score - penalty).max(0.0);
                }
                if vulnerability.matches_any_keyword(MESSAGE_KEYWORDS) {
                    message_passing_score = (message_passing_score - penalty).max(0.0);
                }
                if vulnerability.matches_any_keyword(VALIDATOR_KEYWORDS) {
                    validator_set_score = (validator_set_score - penalty).max(0.0);
                }
            }
        }

        let overall_score = (locking_score + message_passing_score + validator_set_score) / 3.0;

        BridgeSecurityAssessment {
            overall_score,
            locking_score,
            message_passing_score,
            validator_set_score,
            bridge_platforms,
        }
    }

    /// State consistency: per platform pair, finding types present on one
    /// side and absent on the other become consistency issues.
    fn analyze_state_consistency(
        &self,
        results: &BTreeMap<&PlatformId, &AnalysisResult>,
    ) -> StateConsistencyReport {
        let state_types: BTreeMap<&PlatformId, BTreeSet<&str>> = results
            .iter()
            .map(|(platform, result)| {
                let types: BTreeSet<&str> = result
                    .vulnerabilities
                    .iter()
                    .filter(|v| v.matches_any_keyword(STATE_KEYWORDS))
                    .map(|v| v.vuln_type.as_str())
                    .collect();
                (*platform, types)
            })
            .collect();

        let mut issues = Vec::new();
        for (platform_a, types_a) in &state_types {
            for (platform_b, types_b) in &state_types {
                if platform_a == platform_b {
                    continue;
                }
                for missing_type in types_a.difference(types_b) {
                    issues.push(ConsistencyIssue {
                        issue_type: missing_type.to_string(),
                        present_on: (*platform_a).clone(),
                        missing_on: (*platform_b).clone(),
                        risk: self.config.consistency_risk_weight,
                        description: format!(
                            "State-related finding type '{}' reported on {} but not on {}",
                            missing_type, platform_a, platform_b
                        ),
                    });
                }
            }
        }

        let potential_inconsistencies: Vec<ConsistencyIssue> = issues
            .iter()
            .filter(|issue| issue.risk > self.config.inconsistency_threshold)
            .cloned()
            .collect();

        StateConsistencyReport {
            issues,
            potential_inconsistencies,
        }
    }

    /// Interoperability catalog: pair rules keyed on execution models,
    /// universal risks for any multi-platform deployment, and a
    /// governance-centralization risk when admin/upgrade findings exist.
    fn catalog_interoperability_risks(
        &self,
        results: &BTreeMap<&PlatformId, &AnalysisResult>,
    ) -> Vec<InteroperabilityRisk> {
        let platforms: Vec<&PlatformId> = results.keys().copied().collect();
        let mut risks = Vec::new();

        for i in 0..platforms.len() {
            for j in (i + 1)..platforms.len() {
                let platform_a = platforms[i];
                let platform_b = platforms[j];
                let models = (
                    self.registry.execution_model(platform_a),
                    self.registry.execution_model(platform_b),
                );
                let (Some(model_a), Some(model_b)) = models else {
                    continue;
                };

                if let Some(risk) = pair_risk(model_a, model_b) {
                    risks.push(InteroperabilityRisk {
                        risk_type: risk.risk_type.to_string(),
                        severity: risk.severity,
                        description: risk.description.to_string(),
                        affected_platforms: vec![platform_a.clone(), platform_b.clone()],
                        mitigation: risk.mitigation.to_string(),
                    });
                }
            }
        }

        if platforms.len() >= 2 {
            let all: Vec<PlatformId> = platforms.iter().map(|p| (*p).clone()).collect();
            risks.push(InteroperabilityRisk {
                risk_type: "finality-mismatch".to_string(),
                severity: Severity::Medium,
                description: "Participating chains reach finality on different timescales; \
                              cross-chain actions can observe unconfirmed state"
                    .to_string(),
                affected_platforms: all.clone(),
                mitigation: "Wait for chain-appropriate confirmation depths before acting on \
                             cross-chain events"
                    .to_string(),
            });
            risks.push(InteroperabilityRisk {
                risk_type: "economic-security-disparity".to_string(),
                severity: Severity::Medium,
                description: "The chains secure value with different economic guarantees; the \
                              weakest chain bounds the security of the whole deployment"
                    .to_string(),
                affected_platforms: all,
                mitigation: "Size cross-chain value limits to the least economically secure \
                             participating chain"
                    .to_string(),
            });
        }

        let governance_platforms: Vec<PlatformId> = results
            .iter()
            .filter(|(_, result)| {
                result
                    .vulnerabilities
                    .iter()
                    .any(|v| v.matches_any_keyword(GOVERNANCE_KEYWORDS))
            })
            .map(|(platform, _)| (*platform).clone())
            .collect();

        if !governance_platforms.is_empty() {
            risks.push(InteroperabilityRisk {
                risk_type: "governance-centralization".to_string(),
                severity: Severity::High,
                description: "Governance, admin or upgrade findings indicate centralized control \
                              points across the deployment"
                    .to_string(),
                affected_platforms: governance_platforms,
                mitigation: "Move privileged operations behind timelocks and distributed key \
                             control"
                    .to_string(),
            });
        }

        // Stable sort keeps generation order within equal severities
        risks.sort_by_key(|risk| std::cmp::Reverse(risk.severity.weight()));
        risks
    }

    /// One recommendation per risk, fixed general recommendations, and a
    /// per-platform recommendation for critical findings.
    fn build_recommendations(
        &self,
        risks: &[InteroperabilityRisk],
        results: &BTreeMap<&PlatformId, &AnalysisResult>,
    ) -> Vec<CrossChainRecommendation> {
        let mut recommendations = Vec::new();

        for risk in risks {
            let priority = if matches!(risk.severity, Severity::Critical | Severity::High) {
                RecommendationPriority::High
            } else {
                RecommendationPriority::Medium
            };
            recommendations.push(CrossChainRecommendation::general(
                priority,
                risk.mitigation.clone(),
            ));
        }

        if !results.is_empty() {
            recommendations.push(CrossChainRecommendation::general(
                RecommendationPriority::Medium,
                "Monitor bridged value and cross-chain message flows continuously",
            ));
            recommendations.push(CrossChainRecommendation::general(
                RecommendationPriority::Medium,
                "Run integration tests that exercise the full cross-chain path before deployment",
            ));
            recommendations.push(CrossChainRecommendation::general(
                RecommendationPriority::Low,
                "Document the trust assumptions of every cross-chain interaction",
            ));
        }

        for (platform, result) in results {
            if result.critical_count() > 0 {
                recommendations.push(CrossChainRecommendation::for_platform(
                    RecommendationPriority::High,
                    (*platform).clone(),
                    format!(
                        "Resolve the {} critical finding(s) on {} before any cross-chain deployment",
                        result.critical_count(),
                        platform
                    ),
                ));
            }
        }

        recommendations.sort_by_key(|rec| std::cmp::Reverse(rec.priority.weight()));
        recommendations
    }
}

struct PairRisk {
    risk_type: &'static str,
    severity: Severity,
    description: &'static str,
    mitigation: &'static str,
}

/// Fixed rule table keyed on unordered execution-model pairs
fn pair_risk(a: ExecutionModel, b: ExecutionModel) -> Option<PairRisk> {
    use ExecutionModel::*;

    let pair = if a as u8 <= b as u8 { (a, b) } else { (b, a) };
    match pair {
        (Account, Account) => Some(PairRisk {
            risk_type: "security-model-mismatch",
            severity: Severity::Medium,
            description: "Both chains use account-model runtimes with differing ownership and \
                          signer semantics",
            mitigation: "Audit account ownership and signer assumptions on both chains together",
        }),
        (Account, Utxo) | (Evm, Utxo) => Some(PairRisk {
            risk_type: "transaction-model-mismatch",
            severity: Severity::High,
            description: "Account-based and UTXO-based transaction models disagree on state \
                          visibility and ordering",
            mitigation: "Model cross-chain flows explicitly against both transaction semantics \
                         and verify double-spend handling",
        }),
        (Evm, Account) => Some(PairRisk {
            risk_type: "execution-environment-mismatch",
            severity: Severity::Medium,
            description: "EVM bytecode and account-model program runtimes differ in reentrancy \
                          and call semantics",
            mitigation: "Verify that invariants preserved by one runtime are re-established on \
                         the other",
        }),
        // Same-model EVM/UTXO pairs and unnormalized orderings (prevented
        // by the pair normalization above)
        _ => None,
    }
}
