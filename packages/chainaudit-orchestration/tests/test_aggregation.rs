//! Cross-platform aggregation policy tests
//!
//! Validate the scoring/sorting policy over mixed-severity fixtures: the
//! exact keyword lists are a starting configuration, the policies
//! (floors, means, descending stable sorts, platform-count gating) are
//! the contract.

use std::collections::HashMap;

use chainaudit_core::{
    AnalysisOrigin, AnalysisResult, Confidence, Location, PlatformId, PlatformRegistry,
    RecommendationPriority, Severity, Vulnerability,
};
use chainaudit_orchestration::{AggregatorConfig, RiskAggregator};

fn finding(platform: &str, vuln_type: &str, severity: Severity, text: &str) -> Vulnerability {
    Vulnerability {
        vuln_type: vuln_type.to_string(),
        severity,
        title: text.to_string(),
        description: text.to_string(),
        location: Location::new("contract.src", 3),
        recommendation: "Fix the finding".to_string(),
        confidence: Confidence::new(0.8),
        origin: AnalysisOrigin::Static,
        platform: PlatformId::new(platform),
    }
}

fn results(entries: Vec<(&str, Vec<Vulnerability>)>) -> HashMap<PlatformId, AnalysisResult> {
    entries
        .into_iter()
        .map(|(platform, vulns)| {
            (
                PlatformId::new(platform),
                AnalysisResult::success(vulns, 10),
            )
        })
        .collect()
}

fn aggregator() -> RiskAggregator {
    RiskAggregator::new(
        PlatformRegistry::with_defaults(),
        AggregatorConfig::default(),
    )
}

#[test]
fn test_empty_input_yields_empty_report() {
    let result = aggregator().aggregate(&HashMap::new());

    assert_eq!(result.bridge_security.overall_score, 0.0);
    assert!(result.bridge_security.bridge_platforms.is_empty());
    assert!(result.risks.is_empty());
    assert!(result.state_consistency.issues.is_empty());
    assert!(result.recommendations.is_empty());
}

#[test]
fn test_single_platform_gets_general_recommendations_only() {
    let input = results(vec![("cardano", vec![])]);
    let result = aggregator().aggregate(&input);

    assert!(result.risks.is_empty(), "pair/universal risks need 2 platforms");
    assert!(!result.recommendations.is_empty());
    assert!(result.recommendations.iter().all(|r| r.platform.is_none()));
}

#[test]
fn test_registered_pair_risk_lists_both_platforms() {
    // solana (account) + cardano (utxo) -> transaction-model mismatch, high
    let input = results(vec![("solana", vec![]), ("cardano", vec![])]);
    let result = aggregator().aggregate(&input);

    let pair: Vec<_> = result
        .risks
        .iter()
        .filter(|r| r.risk_type == "transaction-model-mismatch")
        .collect();
    assert_eq!(pair.len(), 1);
    assert_eq!(pair[0].severity, Severity::High);
    assert!(pair[0].affected_platforms.contains(&PlatformId::new("solana")));
    assert!(pair[0].affected_platforms.contains(&PlatformId::new("cardano")));
}

#[test]
fn test_mixed_severity_fixture_sorting_and_stability() {
    // High pair risk (evm+utxo), medium universal risks, high governance
    // risk - generation order within the same weight must be preserved
    let input = results(vec![
        (
            "ethereum",
            vec![finding(
                "ethereum",
                "unprotected-upgrade",
                Severity::High,
                "admin can upgrade without timelock",
            )],
        ),
        ("cardano", vec![]),
    ]);

    let result = aggregator().aggregate(&input);

    let weights: Vec<u8> = result.risks.iter().map(|r| r.severity.weight()).collect();
    let mut sorted = weights.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(weights, sorted);

    // Both high risks present; the pair risk was generated before the
    // governance risk and the stable sort must keep that order
    let high_types: Vec<&str> = result
        .risks
        .iter()
        .filter(|r| r.severity == Severity::High)
        .map(|r| r.risk_type.as_str())
        .collect();
    assert_eq!(
        high_types,
        vec!["transaction-model-mismatch", "governance-centralization"]
    );

    let priorities: Vec<u8> = result
        .recommendations
        .iter()
        .map(|r| r.priority.weight())
        .collect();
    let mut sorted = priorities.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(priorities, sorted);
}

#[test]
fn test_bridge_scores_floor_at_zero_and_average() {
    let mut vulns = Vec::new();
    for _ in 0..10 {
        vulns.push(finding(
            "ethereum",
            "bridge-lock-flaw",
            Severity::Critical,
            "bridge escrow lock can be drained",
        ));
    }

    let input = results(vec![("ethereum", vulns)]);
    let result = aggregator().aggregate(&input);
    let bridge = &result.bridge_security;

    assert_eq!(bridge.locking_score, 0.0);
    assert!(bridge.message_passing_score >= 0.0 && bridge.message_passing_score <= 100.0);
    assert!(bridge.validator_set_score >= 0.0 && bridge.validator_set_score <= 100.0);
    assert_eq!(
        bridge.overall_score,
        (bridge.locking_score + bridge.message_passing_score + bridge.validator_set_score) / 3.0
    );
}

#[test]
fn test_bridge_penalties_are_configurable() {
    let lenient = RiskAggregator::new(
        PlatformRegistry::with_defaults(),
        AggregatorConfig {
            high_penalty: 1.0,
            critical_penalty: 2.0,
            ..AggregatorConfig::default()
        },
    );

    let input = results(vec![(
        "ethereum",
        vec![finding(
            "ethereum",
            "bridge-lock-flaw",
            Severity::Critical,
            "bridge escrow lock can be drained",
        )],
    )]);

    let result = lenient.aggregate(&input);
    assert_eq!(result.bridge_security.locking_score, 98.0);
}

#[test]
fn test_unsuccessful_platforms_are_invisible() {
    let mut input = results(vec![("ethereum", vec![])]);
    input.insert(
        PlatformId::new("cardano"),
        AnalysisResult::failure(vec!["analyzer crashed".to_string()], 5),
    );

    let result = aggregator().aggregate(&input);
    // cardano failed: no evm+utxo pair risk, no universal risks
    assert!(result.risks.is_empty());
}

#[test]
fn test_critical_findings_produce_platform_recommendation() {
    let input = results(vec![
        (
            "ethereum",
            vec![finding(
                "ethereum",
                "reentrancy",
                Severity::Critical,
                "reentrant withdrawal drains funds",
            )],
        ),
        ("solana", vec![]),
    ]);

    let result = aggregator().aggregate(&input);

    let platform_recs: Vec<_> = result
        .recommendations
        .iter()
        .filter(|r| r.platform == Some(PlatformId::new("ethereum")))
        .collect();
    assert_eq!(platform_recs.len(), 1);
    assert_eq!(platform_recs[0].priority, RecommendationPriority::High);
}

#[test]
fn test_consistency_issues_surface_above_threshold() {
    let input = results(vec![
        (
            "ethereum",
            vec![finding(
                "ethereum",
                "stale-balance",
                Severity::Medium,
                "balance state read before settlement",
            )],
        ),
        ("solana", vec![]),
    ]);

    let result = aggregator().aggregate(&input);
    assert_eq!(result.state_consistency.issues.len(), 1);
    assert_eq!(result.state_consistency.potential_inconsistencies.len(), 1);

    // Below-threshold weights stay out of the surfaced list
    let quiet = RiskAggregator::new(
        PlatformRegistry::with_defaults(),
        AggregatorConfig {
            consistency_risk_weight: 0.3,
            ..AggregatorConfig::default()
        },
    );
    let result = quiet.aggregate(&input);
    assert_eq!(result.state_consistency.issues.len(), 1);
    assert!(result.state_consistency.potential_inconsistencies.is_empty());
}
