//! Fallback degradation engine
//!
//! Ordered ladder of progressively weaker analysis strategies: primary
//! analyzer with retry/backoff, AI-only, basic validation, cached results,
//! minimal floor. The engine is total - it always returns a
//! `FallbackAnalysisResult`. The returned result is unsuccessful only when
//! the terminal primary error leaves no degraded tier applicable
//! (compilation/validation class failures).

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use chainaudit_core::{
    AnalysisOptions, AnalysisOrigin, AnalysisResult, Confidence, ContractSource, DegradationLevel,
    FallbackStrategy, Location, PlatformId, Severity, Vulnerability,
};

use crate::cache::ResultCache;
use crate::classify::{classify, classify_error, PlatformError, PlatformErrorKind};
use crate::collaborators::{AiAnalyzer, ContractValidator, PlatformAnalyzer};

/// Fallback ladder configuration. Tier toggles plus primary retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    pub enable_ai_only: bool,
    pub enable_basic_validation: bool,
    pub enable_cached_results: bool,
    pub max_retry_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub attempt_timeout_ms: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enable_ai_only: true,
            enable_basic_validation: true,
            enable_cached_results: true,
            max_retry_attempts: 3,
            retry_base_delay_ms: 500,
            attempt_timeout_ms: 60_000,
        }
    }
}

/// One recorded tier attempt
#[derive(Debug, Clone)]
pub struct FallbackAttempt {
    pub strategy: FallbackStrategy,
    /// 1-based attempt number within the strategy (only primary retries)
    pub attempt: u32,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<PlatformError>,
}

/// Engine output: the result plus the ordered attempt log
#[derive(Debug, Clone)]
pub struct FallbackAnalysisResult {
    pub result: AnalysisResult,
    pub strategy: FallbackStrategy,
    pub degradation_level: DegradationLevel,
    pub attempts: Vec<FallbackAttempt>,
    /// Set when `result.success` is false
    pub error: Option<PlatformError>,
}

/// Explicitly constructed fallback service owning its collaborators and
/// result cache; passed into the orchestrator by handle.
pub struct FallbackEngine {
    ai: Arc<dyn AiAnalyzer>,
    validator: Arc<dyn ContractValidator>,
    cache: Arc<ResultCache>,
    config: FallbackConfig,
}

impl FallbackEngine {
    pub fn new(
        ai: Arc<dyn AiAnalyzer>,
        validator: Arc<dyn ContractValidator>,
        cache: Arc<ResultCache>,
        config: FallbackConfig,
    ) -> Self {
        Self {
            ai,
            validator,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Run the degradation ladder for one platform's contract group.
    pub async fn analyze_with_fallback(
        &self,
        analyzer: &dyn PlatformAnalyzer,
        platform: &PlatformId,
        contracts: &[ContractSource],
        options: &AnalysisOptions,
    ) -> FallbackAnalysisResult {
        let mut attempts = Vec::new();

        // Tier 1: primary analyzer with retry + exponential backoff
        let primary_error = match self
            .primary_tier(analyzer, platform, contracts, options, &mut attempts)
            .await
        {
            Ok(result) => {
                return FallbackAnalysisResult {
                    result,
                    strategy: FallbackStrategy::Primary,
                    degradation_level: DegradationLevel::None,
                    attempts,
                    error: None,
                };
            }
            Err(error) => error,
        };

        if !primary_error.fallback_available {
            warn!(
                platform = %platform,
                kind = %primary_error.kind,
                "Primary analysis failed with no fallback available"
            );
            let result = AnalysisResult::failure(
                vec![primary_error.to_string()],
                total_duration_ms(&attempts),
            );
            return FallbackAnalysisResult {
                result,
                strategy: FallbackStrategy::Primary,
                degradation_level: DegradationLevel::None,
                attempts,
                error: Some(primary_error),
            };
        }

        info!(
            platform = %platform,
            kind = %primary_error.kind,
            "Primary analysis failed, entering fallback ladder"
        );

        // Tier 2: AI-only
        if self.config.enable_ai_only {
            if let Some(result) = self
                .ai_only_tier(platform, contracts, &primary_error, &mut attempts)
                .await
            {
                return FallbackAnalysisResult {
                    result,
                    strategy: FallbackStrategy::AiOnly,
                    degradation_level: DegradationLevel::Partial,
                    attempts,
                    error: None,
                };
            }
        }

        // Tier 3: basic validation (cannot fail)
        if self.config.enable_basic_validation {
            let result = self
                .basic_validation_tier(platform, contracts, &primary_error, &mut attempts)
                .await;
            return FallbackAnalysisResult {
                result,
                strategy: FallbackStrategy::BasicValidation,
                degradation_level: DegradationLevel::Significant,
                attempts,
                error: None,
            };
        }

        // Tier 4: cached results
        if self.config.enable_cached_results {
            if let Some(result) = self.cached_tier(platform, contracts, &primary_error, &mut attempts)
            {
                return FallbackAnalysisResult {
                    result,
                    strategy: FallbackStrategy::CachedResults,
                    degradation_level: DegradationLevel::Significant,
                    attempts,
                    error: None,
                };
            }
        }

        // Tier 5: minimal floor, unconditionally successful
        let result = self.minimal_tier(platform, &mut attempts);
        FallbackAnalysisResult {
            result,
            strategy: FallbackStrategy::Minimal,
            degradation_level: DegradationLevel::Minimal,
            attempts,
            error: None,
        }
    }

    async fn primary_tier(
        &self,
        analyzer: &dyn PlatformAnalyzer,
        platform: &PlatformId,
        contracts: &[ContractSource],
        options: &AnalysisOptions,
        attempts: &mut Vec<FallbackAttempt>,
    ) -> std::result::Result<AnalysisResult, PlatformError> {
        let timeout = Duration::from_millis(self.config.attempt_timeout_ms);
        let max_attempts = self.config.max_retry_attempts.max(1);
        let mut last_error: Option<PlatformError> = None;

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                // base delay × 2^(retry−1)
                let backoff = Duration::from_millis(
                    self.config.retry_base_delay_ms * 2u64.pow(attempt.saturating_sub(2)),
                );
                tokio::time::sleep(backoff).await;
            }

            let started = Instant::now();
            let outcome = tokio::time::timeout(timeout, analyzer.analyze(contracts, options)).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            let error = match outcome {
                Ok(Ok(mut result)) if result.success => {
                    self.cache_contract_fragments(contracts, &result);
                    result = result.with_fallback_metadata(
                        FallbackStrategy::Primary,
                        DegradationLevel::None,
                    );
                    attempts.push(FallbackAttempt {
                        strategy: FallbackStrategy::Primary,
                        attempt,
                        success: true,
                        duration_ms,
                        error: None,
                    });
                    return Ok(result);
                }
                Ok(Ok(result)) => {
                    let message = if result.errors.is_empty() {
                        "analyzer reported failure without errors".to_string()
                    } else {
                        result.errors.join("; ")
                    };
                    classify(&message, Some(platform))
                }
                Ok(Err(e)) => classify_error(&e, Some(platform)),
                Err(_) => PlatformError::new(
                    PlatformErrorKind::ToolTimeout,
                    format!(
                        "analysis attempt timed out after {}ms",
                        self.config.attempt_timeout_ms
                    ),
                )
                .for_platform(platform.clone()),
            };

            attempts.push(FallbackAttempt {
                strategy: FallbackStrategy::Primary,
                attempt,
                success: false,
                duration_ms,
                error: Some(error.clone()),
            });

            let retryable = error.retryable;
            last_error = Some(error);
            if !retryable {
                break;
            }
        }

        // max_attempts >= 1, so at least one attempt was recorded
        Err(last_error.unwrap_or_else(|| {
            PlatformError::new(PlatformErrorKind::AnalyzerUnavailable, "no attempt recorded")
                .for_platform(platform.clone())
        }))
    }

    async fn ai_only_tier(
        &self,
        platform: &PlatformId,
        contracts: &[ContractSource],
        trigger: &PlatformError,
        attempts: &mut Vec<FallbackAttempt>,
    ) -> Option<AnalysisResult> {
        let started = Instant::now();
        let focus = ai_focus_areas(platform);

        let mut vulnerabilities = Vec::new();
        let mut errors = Vec::new();
        let mut usable = 0usize;

        for contract in contracts {
            let outcome = self.ai.analyze_contract(contract, &focus).await;
            if outcome.success {
                usable += 1;
                vulnerabilities.extend(outcome.vulnerabilities);
            } else if let Some(error) = outcome.error {
                errors.push(format!("{}: {}", contract.filename, error));
            }
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        let succeeded = usable > 0 || errors.is_empty();

        attempts.push(FallbackAttempt {
            strategy: FallbackStrategy::AiOnly,
            attempt: 1,
            success: succeeded,
            duration_ms,
            error: if succeeded {
                None
            } else {
                Some(
                    PlatformError::new(
                        PlatformErrorKind::AnalyzerUnavailable,
                        format!("AI analysis produced no usable result: {}", errors.join("; ")),
                    )
                    .for_platform(platform.clone()),
                )
            },
        });

        if !succeeded {
            return None;
        }

        info!(
            platform = %platform,
            findings = vulnerabilities.len(),
            "AI-only fallback succeeded"
        );

        let result = AnalysisResult::success(vulnerabilities, duration_ms)
            .with_warnings(vec![format!(
                "AI-only analysis: primary analyzer failed ({})",
                trigger.kind
            )])
            .with_fallback_metadata(FallbackStrategy::AiOnly, DegradationLevel::Partial);
        Some(result)
    }

    async fn basic_validation_tier(
        &self,
        platform: &PlatformId,
        contracts: &[ContractSource],
        trigger: &PlatformError,
        attempts: &mut Vec<FallbackAttempt>,
    ) -> AnalysisResult {
        let started = Instant::now();
        let mut vulnerabilities = Vec::new();

        for contract in contracts {
            let report = self.validator.validate(contract).await;

            for error in report.errors {
                vulnerabilities.push(validation_finding(
                    "validation-error",
                    Severity::Medium,
                    0.4,
                    contract,
                    platform,
                    error,
                ));
            }
            for warning in report.warnings {
                vulnerabilities.push(validation_finding(
                    "validation-warning",
                    Severity::Low,
                    0.2,
                    contract,
                    platform,
                    warning,
                ));
            }
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        attempts.push(FallbackAttempt {
            strategy: FallbackStrategy::BasicValidation,
            attempt: 1,
            success: true,
            duration_ms,
            error: None,
        });

        AnalysisResult::success(vulnerabilities, duration_ms)
            .with_warnings(vec![format!(
                "Structural validation only: primary analyzer failed ({})",
                trigger.kind
            )])
            .with_fallback_metadata(FallbackStrategy::BasicValidation, DegradationLevel::Significant)
    }

    fn cached_tier(
        &self,
        platform: &PlatformId,
        contracts: &[ContractSource],
        trigger: &PlatformError,
        attempts: &mut Vec<FallbackAttempt>,
    ) -> Option<AnalysisResult> {
        let started = Instant::now();
        let mut vulnerabilities = Vec::new();
        let mut warnings = Vec::new();

        // Succeeds only if every contract has a fresh entry
        for contract in contracts {
            match self.cache.get(&contract.fingerprint()) {
                Some(entry) => {
                    vulnerabilities.extend(entry.vulnerabilities);
                    warnings.extend(entry.warnings);
                }
                None => {
                    attempts.push(FallbackAttempt {
                        strategy: FallbackStrategy::CachedResults,
                        attempt: 1,
                        success: false,
                        duration_ms: started.elapsed().as_millis() as u64,
                        error: Some(
                            PlatformError::new(
                                PlatformErrorKind::AnalyzerUnavailable,
                                format!("no cached result for {}", contract.filename),
                            )
                            .for_platform(platform.clone()),
                        ),
                    });
                    return None;
                }
            }
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        attempts.push(FallbackAttempt {
            strategy: FallbackStrategy::CachedResults,
            attempt: 1,
            success: true,
            duration_ms,
            error: None,
        });

        warnings.push(format!(
            "Results served from cache: primary analyzer failed ({})",
            trigger.kind
        ));

        Some(
            AnalysisResult::success(vulnerabilities, duration_ms)
                .with_warnings(warnings)
                .with_fallback_metadata(FallbackStrategy::CachedResults, DegradationLevel::Significant),
        )
    }

    fn minimal_tier(
        &self,
        platform: &PlatformId,
        attempts: &mut Vec<FallbackAttempt>,
    ) -> AnalysisResult {
        attempts.push(FallbackAttempt {
            strategy: FallbackStrategy::Minimal,
            attempt: 1,
            success: true,
            duration_ms: 0,
            error: None,
        });

        warn!(platform = %platform, "All analysis tiers exhausted, returning minimal result");

        AnalysisResult::success(vec![], 0)
            .with_warnings(vec![
                "No analysis was performed: the platform analyzer and every enabled fallback tier were unavailable".to_string(),
                "Re-submit once the platform tooling is restored".to_string(),
            ])
            .with_fallback_metadata(FallbackStrategy::Minimal, DegradationLevel::Minimal)
    }

    /// Store per-contract fragments of a successful primary result so the
    /// cached-results tier has a data source
    fn cache_contract_fragments(&self, contracts: &[ContractSource], result: &AnalysisResult) {
        for contract in contracts {
            let fragment: Vec<Vulnerability> = result
                .vulnerabilities
                .iter()
                .filter(|v| v.location.file == contract.filename)
                .cloned()
                .collect();
            self.cache.put(contract.fingerprint(), fragment, Vec::new());
        }
    }
}

fn total_duration_ms(attempts: &[FallbackAttempt]) -> u64 {
    attempts.iter().map(|a| a.duration_ms).sum()
}

fn validation_finding(
    vuln_type: &str,
    severity: Severity,
    confidence: f64,
    contract: &ContractSource,
    platform: &PlatformId,
    message: String,
) -> Vulnerability {
    Vulnerability {
        vuln_type: vuln_type.to_string(),
        severity,
        title: format!("{} in {}", vuln_type, contract.filename),
        description: message,
        location: Location::new(contract.filename.clone(), 1),
        recommendation: "Resolve the structural issue and re-submit for full analysis".to_string(),
        confidence: Confidence::new(confidence),
        origin: AnalysisOrigin::Static,
        platform: platform.clone(),
    }
}

/// Platform-specific AI focus areas. Starting configuration, not a contract.
fn ai_focus_areas(platform: &PlatformId) -> Vec<String> {
    let areas: &[&str] = match platform.as_str() {
        "ethereum" => &["reentrancy", "access-control", "integer-overflow", "delegatecall"],
        "solana" => &["account-validation", "signer-checks", "cpi-safety", "pda-derivation"],
        "cardano" => &["datum-validation", "utxo-contention", "minting-policy"],
        _ => &["access-control", "input-validation", "arithmetic-safety"],
    };
    areas.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{AiOutcome, ValidationReport};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingAnalyzer {
        message: &'static str,
        calls: AtomicUsize,
    }

    impl FailingAnalyzer {
        fn new(message: &'static str) -> Self {
            Self {
                message,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PlatformAnalyzer for FailingAnalyzer {
        async fn analyze(
            &self,
            _contracts: &[ContractSource],
            _options: &AnalysisOptions,
        ) -> anyhow::Result<AnalysisResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("{}", self.message)
        }
    }

    struct SucceedingAnalyzer;

    #[async_trait]
    impl PlatformAnalyzer for SucceedingAnalyzer {
        async fn analyze(
            &self,
            contracts: &[ContractSource],
            _options: &AnalysisOptions,
        ) -> anyhow::Result<AnalysisResult> {
            let platform = contracts[0].platform.clone();
            let vulnerability = Vulnerability {
                vuln_type: "reentrancy".to_string(),
                severity: Severity::High,
                title: "Reentrant withdraw".to_string(),
                description: "External call before state update".to_string(),
                location: Location::new(contracts[0].filename.clone(), 42),
                recommendation: "Apply checks-effects-interactions".to_string(),
                confidence: Confidence::new(0.9),
                origin: AnalysisOrigin::Static,
                platform,
            };
            Ok(AnalysisResult::success(vec![vulnerability], 25))
        }
    }

    struct StubAi {
        succeed: bool,
    }

    #[async_trait]
    impl AiAnalyzer for StubAi {
        async fn analyze_contract(
            &self,
            contract: &ContractSource,
            _focus_areas: &[String],
        ) -> AiOutcome {
            if self.succeed {
                AiOutcome {
                    success: true,
                    vulnerabilities: vec![Vulnerability {
                        vuln_type: "access-control".to_string(),
                        severity: Severity::Medium,
                        title: "Missing access check".to_string(),
                        description: "Function callable by anyone".to_string(),
                        location: Location::new(contract.filename.clone(), 7),
                        recommendation: "Restrict the caller".to_string(),
                        confidence: Confidence::new(0.6),
                        origin: AnalysisOrigin::Ai,
                        platform: contract.platform.clone(),
                    }],
                    error: None,
                }
            } else {
                AiOutcome {
                    success: false,
                    vulnerabilities: vec![],
                    error: Some("model unavailable".to_string()),
                }
            }
        }
    }

    struct StubValidator;

    #[async_trait]
    impl ContractValidator for StubValidator {
        async fn validate(&self, _contract: &ContractSource) -> ValidationReport {
            ValidationReport {
                is_valid: false,
                errors: vec!["unbalanced braces".to_string()],
                warnings: vec!["missing license header".to_string()],
            }
        }
    }

    fn engine(ai_succeeds: bool, config: FallbackConfig) -> FallbackEngine {
        FallbackEngine::new(
            Arc::new(StubAi {
                succeed: ai_succeeds,
            }),
            Arc::new(StubValidator),
            Arc::new(ResultCache::new(600)),
            config,
        )
    }

    fn fast_config() -> FallbackConfig {
        FallbackConfig {
            max_retry_attempts: 3,
            retry_base_delay_ms: 1,
            attempt_timeout_ms: 1_000,
            ..FallbackConfig::default()
        }
    }

    fn contracts() -> Vec<ContractSource> {
        vec![ContractSource::new(
            "ethereum",
            "token.sol",
            "contract Token {}",
        )]
    }

    #[tokio::test]
    async fn test_primary_success_no_degradation() {
        let engine = engine(true, fast_config());
        let outcome = engine
            .analyze_with_fallback(
                &SucceedingAnalyzer,
                &PlatformId::new("ethereum"),
                &contracts(),
                &AnalysisOptions::default(),
            )
            .await;

        assert!(outcome.result.success);
        assert_eq!(outcome.strategy, FallbackStrategy::Primary);
        assert_eq!(outcome.degradation_level, DegradationLevel::None);
        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(outcome.result.vulnerabilities.len(), 1);
    }

    #[tokio::test]
    async fn test_retryable_failure_retries_then_falls_back_to_ai() {
        let analyzer = FailingAnalyzer::new("analyzer unavailable: connection refused");
        let engine = engine(true, fast_config());

        let outcome = engine
            .analyze_with_fallback(
                &analyzer,
                &PlatformId::new("ethereum"),
                &contracts(),
                &AnalysisOptions::default(),
            )
            .await;

        // Retryable error exhausts all primary attempts
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 3);
        assert!(outcome.result.success);
        assert_eq!(outcome.strategy, FallbackStrategy::AiOnly);
        assert_eq!(outcome.degradation_level, DegradationLevel::Partial);
        // 3 primary attempts + 1 AI attempt
        assert_eq!(outcome.attempts.len(), 4);
    }

    #[tokio::test]
    async fn test_non_retryable_failure_stops_retries() {
        let analyzer = FailingAnalyzer::new("compilation failed: unexpected token");
        let engine = engine(true, fast_config());

        let outcome = engine
            .analyze_with_fallback(
                &analyzer,
                &PlatformId::new("ethereum"),
                &contracts(),
                &AnalysisOptions::default(),
            )
            .await;

        // Single attempt: compilation errors never retry
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 1);
        // Compilation failure defeats every tier
        assert!(!outcome.result.success);
        let error = outcome.error.unwrap();
        assert_eq!(error.kind, PlatformErrorKind::CompilationFailure);
    }

    #[tokio::test]
    async fn test_validation_tier_converts_report_to_findings() {
        let analyzer = FailingAnalyzer::new("tool not installed");
        let mut config = fast_config();
        config.enable_ai_only = false;
        let engine = engine(false, config);

        let outcome = engine
            .analyze_with_fallback(
                &analyzer,
                &PlatformId::new("ethereum"),
                &contracts(),
                &AnalysisOptions::default(),
            )
            .await;

        assert!(outcome.result.success);
        assert_eq!(outcome.strategy, FallbackStrategy::BasicValidation);

        let types: Vec<&str> = outcome
            .result
            .vulnerabilities
            .iter()
            .map(|v| v.vuln_type.as_str())
            .collect();
        assert!(types.contains(&"validation-error"));
        assert!(types.contains(&"validation-warning"));
    }

    #[tokio::test]
    async fn test_cached_tier_requires_every_contract() {
        let analyzer = FailingAnalyzer::new("tool not installed");
        let mut config = fast_config();
        config.enable_ai_only = false;
        config.enable_basic_validation = false;
        let engine = engine(false, config);

        // Nothing cached: ladder bottoms out at the minimal floor
        let outcome = engine
            .analyze_with_fallback(
                &analyzer,
                &PlatformId::new("ethereum"),
                &contracts(),
                &AnalysisOptions::default(),
            )
            .await;
        assert_eq!(outcome.strategy, FallbackStrategy::Minimal);

        // Seed the cache, then the cached tier serves
        let contract = &contracts()[0];
        engine
            .cache()
            .put(contract.fingerprint(), vec![], vec!["from-cache".to_string()]);

        let outcome = engine
            .analyze_with_fallback(
                &analyzer,
                &PlatformId::new("ethereum"),
                &contracts(),
                &AnalysisOptions::default(),
            )
            .await;
        assert_eq!(outcome.strategy, FallbackStrategy::CachedResults);
        assert!(outcome
            .result
            .warnings
            .iter()
            .any(|w| w.contains("from-cache") || w.contains("cache")));
    }

    #[tokio::test]
    async fn test_minimal_floor_when_all_tiers_fail() {
        let analyzer = FailingAnalyzer::new("analyzer unavailable");
        let mut config = fast_config();
        config.enable_ai_only = true; // AI stub fails
        config.enable_basic_validation = false;
        config.enable_cached_results = true; // cache is empty
        let engine = engine(false, config);

        let outcome = engine
            .analyze_with_fallback(
                &analyzer,
                &PlatformId::new("ethereum"),
                &contracts(),
                &AnalysisOptions::default(),
            )
            .await;

        assert!(outcome.result.success, "minimal floor must succeed");
        assert_eq!(outcome.strategy, FallbackStrategy::Minimal);
        assert_eq!(outcome.degradation_level, DegradationLevel::Minimal);
        assert!(outcome.result.vulnerabilities.is_empty());
        assert!(!outcome.result.warnings.is_empty());

        // Attempt log preserves ladder order
        let strategies: Vec<FallbackStrategy> =
            outcome.attempts.iter().map(|a| a.strategy).collect();
        let mut tier_indices: Vec<u8> = strategies.iter().map(|s| s.tier_index()).collect();
        let mut sorted = tier_indices.clone();
        sorted.sort();
        assert_eq!(tier_indices, sorted, "attempt log must follow ladder order");
        tier_indices.dedup();
        assert!(tier_indices.contains(&FallbackStrategy::Minimal.tier_index()));
    }

    #[tokio::test]
    async fn test_primary_success_populates_cache() {
        let engine = engine(true, fast_config());
        let contract_list = contracts();

        engine
            .analyze_with_fallback(
                &SucceedingAnalyzer,
                &PlatformId::new("ethereum"),
                &contract_list,
                &AnalysisOptions::default(),
            )
            .await;

        let cached = engine.cache().get(&contract_list[0].fingerprint());
        assert!(cached.is_some());
        assert_eq!(cached.unwrap().vulnerabilities.len(), 1);
    }
}
