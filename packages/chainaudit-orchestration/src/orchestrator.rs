//! Multi-platform analysis orchestrator
//!
//! Fan-out/fan-in over the job queue: one platform-analysis sub-job per
//! contract group, poll-based settlement tracking with a hard wait ceiling,
//! continue-vs-abort on per-platform failures, best-effort cross-platform
//! aggregation, and single-writer progress updates per run.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use chainaudit_core::{
    AnalysisOptions, AnalysisRequest, AnalysisResult, ContractSource, CrossPlatformResult,
    PlatformId, PlatformRegistry,
};

use crate::aggregate::RiskAggregator;
use crate::classify::{classify, PlatformError, PlatformErrorKind};
use crate::collaborators::{PlatformAnalyzer, ProgressNotifier, RunRepository, UnavailableAnalyzer};
use crate::error::{OrchestratorError, Result};
use crate::fallback::FallbackEngine;
use crate::progress::{fan_in_percent, milestones, ProgressTracker, RunProgress};
use crate::queue::{EnqueueOptions, JobHandle, JobKind, JobQueue, QueueJobState, QueueStats};
use crate::run::{MultiPlatformRun, RunError, RunState, RunStateMachine};

/// Orchestrator timing and priority configuration (waits in milliseconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub poll_interval_ms: u64,
    pub platform_wait_ceiling_ms: u64,
    pub cross_platform_wait_ceiling_ms: u64,
    pub sub_job_stagger_ms: u64,
    /// Sub-jobs run at elevated priority: they belong to an active run
    pub sub_job_priority: i32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2_000,
            platform_wait_ceiling_ms: 600_000,
            cross_platform_wait_ceiling_ms: 300_000,
            sub_job_stagger_ms: 1_000,
            sub_job_priority: 10,
        }
    }
}

/// Parent orchestration job payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentJobPayload {
    pub run_id: Uuid,
    pub request: AnalysisRequest,
}

/// Platform-scoped sub-job payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformJobPayload {
    pub run_id: Uuid,
    pub platform: PlatformId,
    pub contracts: Vec<ContractSource>,
    pub options: AnalysisOptions,
}

/// Cross-platform aggregation job payload. Carries only fully settled
/// results, never partial ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossPlatformJobPayload {
    pub run_id: Uuid,
    pub results: HashMap<PlatformId, AnalysisResult>,
}

type SubJobOutcome = std::result::Result<AnalysisResult, PlatformError>;

enum FanInExit {
    Settled,
    Aborted(PlatformError),
    Cancelled,
}

/// Orchestration engine for multi-platform analysis runs
pub struct AnalysisOrchestrator {
    queue: Arc<dyn JobQueue>,
    registry: PlatformRegistry,
    analyzers: HashMap<PlatformId, Arc<dyn PlatformAnalyzer>>,
    fallback: Arc<FallbackEngine>,
    aggregator: Arc<RiskAggregator>,
    repository: Arc<dyn RunRepository>,
    progress: Arc<ProgressTracker>,
    notifier: Arc<dyn ProgressNotifier>,
    config: OrchestratorConfig,
    cancellations: DashMap<Uuid, CancellationToken>,
}

impl AnalysisOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: Arc<dyn JobQueue>,
        registry: PlatformRegistry,
        analyzers: HashMap<PlatformId, Arc<dyn PlatformAnalyzer>>,
        fallback: Arc<FallbackEngine>,
        aggregator: Arc<RiskAggregator>,
        repository: Arc<dyn RunRepository>,
        progress: Arc<ProgressTracker>,
        notifier: Arc<dyn ProgressNotifier>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            queue,
            registry,
            analyzers,
            fallback,
            aggregator,
            repository,
            progress,
            notifier,
            config,
            cancellations: DashMap::new(),
        }
    }

    /// Validate the request, persist the pending run and enqueue the parent
    /// orchestration job
    pub async fn start_run(&self, owner: &str, request: AnalysisRequest) -> Result<Uuid> {
        request.validate(&self.registry)?;

        let run = MultiPlatformRun::new_pending(
            owner.to_string(),
            request.platforms.clone(),
            request.cross_platform,
        );
        let run_id = run.id;
        self.repository.create_run(&run).await?;
        self.progress.start(run_id, &run.platforms);
        self.cancellations.insert(run_id, CancellationToken::new());

        let payload = serde_json::to_value(ParentJobPayload { run_id, request })
            .map_err(OrchestratorError::serialization)?;
        self.queue
            .enqueue(
                JobKind::MultiPlatformAnalysis,
                payload,
                EnqueueOptions::default(),
            )
            .await?;

        info!(run_id = %run_id, owner = %owner, "Run submitted");
        Ok(run_id)
    }

    /// Progress snapshot for a run. Served from the tracker when present,
    /// otherwise reconstructed deterministically from the persisted run.
    pub async fn get_progress(&self, run_id: Uuid, owner: &str) -> Result<RunProgress> {
        let run = self
            .repository
            .get_run(run_id)
            .await?
            .ok_or(OrchestratorError::RunNotFound(run_id))?;
        if run.owner != owner {
            return Err(OrchestratorError::AccessDenied(run_id));
        }

        Ok(self
            .progress
            .get(run_id)
            .unwrap_or_else(|| RunProgress::reconstruct(&run)))
    }

    /// Cancel a run: queued/delayed sub-jobs are removed and the run is
    /// forced to failed. Sub-jobs already executing are not interrupted.
    pub async fn cancel_run(&self, run_id: Uuid, owner: &str) -> Result<()> {
        let run = self
            .repository
            .get_run(run_id)
            .await?
            .ok_or(OrchestratorError::RunNotFound(run_id))?;
        if run.owner != owner {
            return Err(OrchestratorError::AccessDenied(run_id));
        }
        if run.state.is_terminal() {
            return Err(OrchestratorError::InvalidStateTransition {
                from: run.state.state_name().to_string(),
                to: "failed".to_string(),
            });
        }

        if let Some(token) = self.cancellations.get(&run_id) {
            token.cancel();
        }

        // A pending run has no polling loop observing the token yet
        if matches!(run.state, RunState::Pending { .. }) {
            self.fail_run(run_id, RunError::cancelled("run cancelled by user"))
                .await?;
        }

        info!(run_id = %run_id, "Run cancellation requested");
        Ok(())
    }

    pub async fn queue_stats(&self) -> QueueStats {
        self.queue.stats().await
    }

    /// Parent job processor entrypoint
    pub async fn process_parent_job(
        &self,
        payload: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, String> {
        let parsed: ParentJobPayload = serde_json::from_value(payload)
            .map_err(|e| format!("invalid parent job payload: {}", e))?;
        self.execute_run(parsed).await.map_err(|e| e.to_string())
    }

    /// Platform sub-job processor entrypoint. Failure strings are
    /// serialized `PlatformError` JSON.
    pub async fn process_platform_job(
        &self,
        payload: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, String> {
        let parsed: PlatformJobPayload = serde_json::from_value(payload).map_err(|e| {
            platform_error_json(
                PlatformError::new(
                    PlatformErrorKind::ValidationFailure,
                    format!("invalid platform job payload: {}", e),
                ),
            )
        })?;
        self.run_platform_analysis(parsed).await
    }

    /// Cross-platform aggregation job processor entrypoint
    pub async fn process_cross_platform_job(
        &self,
        payload: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, String> {
        let parsed: CrossPlatformJobPayload = serde_json::from_value(payload).map_err(|e| {
            platform_error_json(PlatformError::new(
                PlatformErrorKind::CrossPlatformAnalysisFailure,
                format!("invalid cross-platform job payload: {}", e),
            ))
        })?;

        let result = self.aggregator.aggregate(&parsed.results);
        serde_json::to_value(&result).map_err(|e| {
            platform_error_json(PlatformError::new(
                PlatformErrorKind::CrossPlatformAnalysisFailure,
                format!("failed to serialize cross-platform result: {}", e),
            ))
        })
    }

    /// Execute the parent job: fan out sub-jobs, poll them to settlement,
    /// merge results, optionally run the cross-platform stage.
    async fn execute_run(&self, payload: ParentJobPayload) -> Result<serde_json::Value> {
        let run_id = payload.run_id;
        let request = payload.request;

        let run = self
            .repository
            .get_run(run_id)
            .await?
            .ok_or(OrchestratorError::RunNotFound(run_id))?;
        if run.state.is_terminal() {
            // Cancelled (or duplicate-delivered) before the parent started
            return Ok(json!({ "status": run.state.state_name() }));
        }

        let cancel = self
            .cancellations
            .get(&run_id)
            .map(|t| t.clone())
            .unwrap_or_default();
        if cancel.is_cancelled() {
            self.fail_run(run_id, RunError::cancelled("run cancelled by user"))
                .await?;
            return Ok(json!({ "status": "failed" }));
        }

        let mut sm = RunStateMachine::new(run);
        sm.start()?;
        let run = sm.into_run();
        self.repository.update_run(&run).await?;
        let owner = run.owner.clone();

        info!(
            run_id = %run_id,
            platforms = run.platforms.len(),
            cross_platform = run.cross_platform,
            "Run analyzing"
        );

        self.progress.update(run_id, |p| {
            p.overall_percent = milestones::INITIALIZED;
            p.current_step = "grouping contracts by platform".to_string();
        });

        // Fan-out: one sub-job per platform group, staggered and at
        // elevated priority
        let groups = request.contracts_by_platform();
        let mut handles: Vec<(PlatformId, Box<dyn JobHandle>)> = Vec::new();
        for (index, (platform, contracts)) in groups.into_iter().enumerate() {
            let payload = serde_json::to_value(PlatformJobPayload {
                run_id,
                platform: platform.clone(),
                contracts,
                options: request.options.clone(),
            })
            .map_err(OrchestratorError::serialization)?;

            let opts = EnqueueOptions::default()
                .with_priority(self.config.sub_job_priority)
                .with_delay(Duration::from_millis(
                    self.config.sub_job_stagger_ms * index as u64,
                ));
            let handle = self
                .queue
                .enqueue(JobKind::PlatformAnalysis, payload, opts)
                .await?;
            handles.push((platform, handle));
        }

        self.progress.update(run_id, |p| {
            p.overall_percent = milestones::SUB_JOBS_ENQUEUED;
            p.current_step = format!("{} platform sub-jobs enqueued", handles.len());
        });
        self.notify_owner(&owner, run_id).await;

        // Fan-in
        let (settled, exit) = self
            .wait_for_platforms(run_id, &owner, &handles, &cancel)
            .await;

        match exit {
            FanInExit::Cancelled => {
                self.fail_run(run_id, RunError::cancelled("run cancelled by user"))
                    .await?;
                return Ok(json!({ "status": "failed", "cancelled": true }));
            }
            FanInExit::Aborted(error) => {
                error!(run_id = %run_id, error = %error, "Run aborted on platform failure");
                self.fail_run(run_id, RunError::from(error)).await?;
                return Ok(json!({ "status": "failed" }));
            }
            FanInExit::Settled => {}
        }

        let mut successes: HashMap<PlatformId, AnalysisResult> = HashMap::new();
        let mut failures: Vec<PlatformError> = Vec::new();
        for (platform, outcome) in settled {
            match outcome {
                Ok(result) => {
                    successes.insert(platform, result);
                }
                Err(error) => failures.push(error),
            }
        }

        if successes.is_empty() {
            let run_error = match failures.len() {
                1 => RunError::from(failures.remove(0)),
                n => RunError::all_platforms_failed(n),
            };
            self.fail_run(run_id, run_error).await?;
            return Ok(json!({ "status": "failed" }));
        }

        for (platform, result) in &successes {
            self.repository
                .record_vulnerabilities(run_id, platform, &result.vulnerabilities)
                .await?;
        }

        self.progress.update(run_id, |p| {
            p.overall_percent = milestones::PLATFORMS_SETTLED;
            p.current_step = "platform analyses complete".to_string();
        });

        // Cross-platform stage: best-effort, failures are omissions
        let cross_platform_result = if run.cross_platform && !successes.is_empty() {
            self.run_cross_platform_stage(run_id, &successes, &cancel)
                .await
        } else {
            None
        };

        self.progress.update(run_id, |p| {
            p.overall_percent = milestones::CROSS_PLATFORM_SETTLED;
            p.current_step = "cross-platform analysis settled".to_string();
        });

        let platforms_succeeded = successes.len();
        let has_cross = cross_platform_result.is_some();

        let mut sm = RunStateMachine::new(
            self.repository
                .get_run(run_id)
                .await?
                .ok_or(OrchestratorError::RunNotFound(run_id))?,
        );
        sm.complete(successes, cross_platform_result)?;
        let run = sm.into_run();
        self.repository.update_run(&run).await?;
        if let Some(cross) = &run.cross_platform_result {
            self.repository
                .record_cross_platform_result(run_id, cross)
                .await?;
        }

        self.progress.update(run_id, |p| {
            p.overall_percent = milestones::FINALIZED;
            p.current_step = "completed".to_string();
        });
        self.progress.mark_terminal(run_id);
        self.notify_owner(&owner, run_id).await;
        self.cancellations.remove(&run_id);

        info!(
            run_id = %run_id,
            platforms_succeeded,
            cross_platform = has_cross,
            "Run completed"
        );

        Ok(json!({
            "status": "completed",
            "platforms_succeeded": platforms_succeeded,
            "cross_platform": has_cross,
        }))
    }

    /// Poll sub-job state until every sub-job settles, the wait ceiling
    /// elapses, the continue-vs-abort policy aborts, or the run is
    /// cancelled. The polling loop is the single writer of this run's
    /// progress entry.
    async fn wait_for_platforms(
        &self,
        run_id: Uuid,
        owner: &str,
        handles: &[(PlatformId, Box<dyn JobHandle>)],
        cancel: &CancellationToken,
    ) -> (HashMap<PlatformId, SubJobOutcome>, FanInExit) {
        let total = handles.len();
        let poll = Duration::from_millis(self.config.poll_interval_ms);
        let deadline =
            Instant::now() + Duration::from_millis(self.config.platform_wait_ceiling_ms);
        let mut settled: HashMap<PlatformId, SubJobOutcome> = HashMap::new();

        loop {
            let mut newly_failed: Vec<PlatformError> = Vec::new();
            let mut newly_settled = false;

            for (platform, handle) in handles {
                // Merge each platform at most once; duplicate completion
                // observations are no-ops
                if settled.contains_key(platform) {
                    continue;
                }
                match handle.state().await {
                    QueueJobState::Completed => {
                        newly_settled = true;
                        let value = handle
                            .return_value()
                            .await
                            .unwrap_or(serde_json::Value::Null);
                        match serde_json::from_value::<AnalysisResult>(value) {
                            Ok(result) => {
                                info!(run_id = %run_id, platform = %platform, "Platform analysis succeeded");
                                settled.insert(platform.clone(), Ok(result));
                            }
                            Err(e) => {
                                let error = PlatformError::new(
                                    PlatformErrorKind::AnalyzerUnavailable,
                                    format!("malformed sub-job result: {}", e),
                                )
                                .for_platform(platform.clone());
                                newly_failed.push(error.clone());
                                settled.insert(platform.clone(), Err(error));
                            }
                        }
                    }
                    QueueJobState::Failed => {
                        newly_settled = true;
                        let raw = handle
                            .failure()
                            .await
                            .unwrap_or_else(|| "platform sub-job failed".to_string());
                        let error = classify(&raw, Some(platform));
                        warn!(
                            run_id = %run_id,
                            platform = %platform,
                            kind = %error.kind,
                            "Platform analysis failed"
                        );
                        newly_failed.push(error.clone());
                        settled.insert(platform.clone(), Err(error));
                    }
                    _ => {}
                }
            }

            if newly_settled {
                self.update_fan_in_progress(run_id, total, &settled);
                self.notify_owner(owner, run_id).await;
            }

            for failure in &newly_failed {
                if !self.should_continue_after_failure(total, failure) {
                    self.remove_unsettled(handles, &settled).await;
                    return (settled, FanInExit::Aborted(failure.clone()));
                }
            }

            if settled.len() == total {
                return (settled, FanInExit::Settled);
            }

            if Instant::now() >= deadline {
                warn!(run_id = %run_id, "Platform wait ceiling exceeded");
                for (platform, handle) in handles {
                    if !settled.contains_key(platform) {
                        handle.remove().await;
                        settled.insert(
                            platform.clone(),
                            Err(PlatformError::new(
                                PlatformErrorKind::ToolTimeout,
                                format!(
                                    "platform analysis did not settle within {}ms",
                                    self.config.platform_wait_ceiling_ms
                                ),
                            )
                            .for_platform(platform.clone())),
                        );
                    }
                }
                self.update_fan_in_progress(run_id, total, &settled);
                return (settled, FanInExit::Settled);
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    self.remove_unsettled(handles, &settled).await;
                    return (settled, FanInExit::Cancelled);
                }
                _ = tokio::time::sleep(poll) => {}
            }
        }
    }

    /// Continue with remaining platforms unless a single-platform run
    /// failed without a retryable, fallback-capable error
    fn should_continue_after_failure(&self, total_platforms: usize, error: &PlatformError) -> bool {
        total_platforms > 1 || (error.retryable && error.fallback_available)
    }

    fn update_fan_in_progress(
        &self,
        run_id: Uuid,
        total: usize,
        settled: &HashMap<PlatformId, SubJobOutcome>,
    ) {
        let mut completed: Vec<PlatformId> = settled
            .iter()
            .filter(|(_, outcome)| outcome.is_ok())
            .map(|(platform, _)| platform.clone())
            .collect();
        completed.sort();
        let mut failed: Vec<PlatformId> = settled
            .iter()
            .filter(|(_, outcome)| outcome.is_err())
            .map(|(platform, _)| platform.clone())
            .collect();
        failed.sort();

        let percent = fan_in_percent(settled.len(), total);
        self.progress.update(run_id, |p| {
            p.overall_percent = percent;
            p.current_step = format!("{}/{} platform analyses settled", settled.len(), total);
            for platform in completed.iter().chain(failed.iter()) {
                p.platform_percent.insert(platform.clone(), 100);
            }
            p.completed_platforms = completed;
            p.failed_platforms = failed;
        });
    }

    async fn remove_unsettled(
        &self,
        handles: &[(PlatformId, Box<dyn JobHandle>)],
        settled: &HashMap<PlatformId, SubJobOutcome>,
    ) {
        for (platform, handle) in handles {
            if !settled.contains_key(platform) {
                handle.remove().await;
            }
        }
    }

    /// Bounded-wait cross-platform stage. Timing out or failing never
    /// fails the run; the result is simply omitted.
    async fn run_cross_platform_stage(
        &self,
        run_id: Uuid,
        successes: &HashMap<PlatformId, AnalysisResult>,
        cancel: &CancellationToken,
    ) -> Option<CrossPlatformResult> {
        let payload = match serde_json::to_value(CrossPlatformJobPayload {
            run_id,
            results: successes.clone(),
        }) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(run_id = %run_id, "Could not serialize cross-platform payload: {}", e);
                return None;
            }
        };

        let handle = match self
            .queue
            .enqueue(
                JobKind::CrossPlatformAnalysis,
                payload,
                EnqueueOptions::default().with_priority(self.config.sub_job_priority),
            )
            .await
        {
            Ok(handle) => handle,
            Err(e) => {
                warn!(run_id = %run_id, "Could not enqueue cross-platform job: {}", e);
                return None;
            }
        };

        let poll = Duration::from_millis(self.config.poll_interval_ms);
        let deadline =
            Instant::now() + Duration::from_millis(self.config.cross_platform_wait_ceiling_ms);

        loop {
            match handle.state().await {
                QueueJobState::Completed => {
                    return handle
                        .return_value()
                        .await
                        .and_then(|value| serde_json::from_value(value).ok());
                }
                QueueJobState::Failed => {
                    let failure = handle.failure().await;
                    warn!(
                        run_id = %run_id,
                        failure = ?failure,
                        "Cross-platform analysis failed; omitting result"
                    );
                    return None;
                }
                _ => {}
            }

            if Instant::now() >= deadline {
                warn!(run_id = %run_id, "Cross-platform analysis timed out; omitting result");
                handle.remove().await;
                return None;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    handle.remove().await;
                    return None;
                }
                _ = tokio::time::sleep(poll) => {}
            }
        }
    }

    /// Platform sub-job body: validate the group, resolve the analyzer and
    /// delegate to the fallback engine
    async fn run_platform_analysis(
        &self,
        payload: PlatformJobPayload,
    ) -> std::result::Result<serde_json::Value, String> {
        let platform = payload.platform;

        if payload.contracts.is_empty() {
            return Err(platform_error_json(
                PlatformError::new(
                    PlatformErrorKind::ValidationFailure,
                    "platform group contains no contracts",
                )
                .for_platform(platform),
            ));
        }
        for contract in &payload.contracts {
            if contract.platform != platform {
                return Err(platform_error_json(
                    PlatformError::new(
                        PlatformErrorKind::ValidationFailure,
                        format!(
                            "contract {} is tagged {} but was dispatched to {}",
                            contract.filename, contract.platform, platform
                        ),
                    )
                    .for_platform(platform),
                ));
            }
            if contract.source.trim().is_empty() {
                return Err(platform_error_json(
                    PlatformError::new(
                        PlatformErrorKind::ValidationFailure,
                        format!("contract {} has empty source", contract.filename),
                    )
                    .for_platform(platform),
                ));
            }
        }

        let analyzer: Arc<dyn PlatformAnalyzer> = self
            .analyzers
            .get(&platform)
            .cloned()
            .unwrap_or_else(|| Arc::new(UnavailableAnalyzer::new(platform.clone())));

        let outcome = self
            .fallback
            .analyze_with_fallback(
                analyzer.as_ref(),
                &platform,
                &payload.contracts,
                &payload.options,
            )
            .await;

        info!(
            run_id = %payload.run_id,
            platform = %platform,
            strategy = %outcome.strategy,
            attempts = outcome.attempts.len(),
            success = outcome.result.success,
            "Platform analysis settled"
        );

        if outcome.result.success {
            serde_json::to_value(&outcome.result).map_err(|e| e.to_string())
        } else {
            let error = outcome.error.unwrap_or_else(|| {
                PlatformError::new(PlatformErrorKind::AnalyzerUnavailable, "analysis failed")
                    .for_platform(platform)
            });
            Err(platform_error_json(error))
        }
    }

    /// Idempotent run failure: no-op when the run is already terminal
    async fn fail_run(&self, run_id: Uuid, error: RunError) -> Result<()> {
        let run = self
            .repository
            .get_run(run_id)
            .await?
            .ok_or(OrchestratorError::RunNotFound(run_id))?;
        if run.state.is_terminal() {
            return Ok(());
        }

        let owner = run.owner.clone();
        let mut sm = RunStateMachine::new(run);
        sm.fail(error.clone())?;
        let run = sm.into_run();
        self.repository.update_run(&run).await?;

        self.progress.update(run_id, |p| {
            p.overall_percent = milestones::FINALIZED;
            p.current_step = "failed".to_string();
            p.error = Some(error.message.clone());
            p.recovery_suggestions = error.recovery_suggestions.clone();
        });
        self.progress.mark_terminal(run_id);
        self.notify_owner(&owner, run_id).await;
        self.cancellations.remove(&run_id);
        Ok(())
    }

    async fn notify_owner(&self, owner: &str, run_id: Uuid) {
        if let Some(snapshot) = self.progress.get(run_id) {
            self.notifier.notify(owner, run_id, &snapshot).await;
        }
    }
}

fn platform_error_json(error: PlatformError) -> String {
    serde_json::to_string(&error).unwrap_or_else(|_| error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.poll_interval_ms, 2_000);
        assert_eq!(config.platform_wait_ceiling_ms, 600_000);
        assert_eq!(config.cross_platform_wait_ceiling_ms, 300_000);
        assert_eq!(config.sub_job_stagger_ms, 1_000);
    }

    #[test]
    fn test_continue_vs_abort_policy() {
        use crate::aggregate::AggregatorConfig;
        use crate::cache::ResultCache;
        use crate::collaborators::{InMemoryRunRepository, NoopNotifier};
        use crate::fallback::FallbackConfig;
        use crate::worker::{InMemoryJobQueue, QueueConfig};
        use chainaudit_core::PlatformRegistry;

        struct NeverAi;
        #[async_trait::async_trait]
        impl crate::collaborators::AiAnalyzer for NeverAi {
            async fn analyze_contract(
                &self,
                _contract: &ContractSource,
                _focus_areas: &[String],
            ) -> crate::collaborators::AiOutcome {
                crate::collaborators::AiOutcome::default()
            }
        }
        struct NeverValidate;
        #[async_trait::async_trait]
        impl crate::collaborators::ContractValidator for NeverValidate {
            async fn validate(
                &self,
                _contract: &ContractSource,
            ) -> crate::collaborators::ValidationReport {
                crate::collaborators::ValidationReport::default()
            }
        }

        let registry = PlatformRegistry::with_defaults();
        let fallback = Arc::new(FallbackEngine::new(
            Arc::new(NeverAi),
            Arc::new(NeverValidate),
            Arc::new(ResultCache::new(600)),
            FallbackConfig::default(),
        ));
        let orchestrator = AnalysisOrchestrator::new(
            Arc::new(InMemoryJobQueue::new(QueueConfig::default())),
            registry.clone(),
            HashMap::new(),
            fallback,
            Arc::new(RiskAggregator::new(registry, AggregatorConfig::default())),
            InMemoryRunRepository::new(),
            Arc::new(ProgressTracker::default()),
            Arc::new(NoopNotifier),
            OrchestratorConfig::default(),
        );

        let retryable_with_fallback =
            PlatformError::new(PlatformErrorKind::ToolTimeout, "timed out");
        let non_retryable =
            PlatformError::new(PlatformErrorKind::CompilationFailure, "bad syntax");

        // Multi-platform runs always continue
        assert!(orchestrator.should_continue_after_failure(3, &non_retryable));
        // Single-platform runs continue only on retryable + fallback-capable
        assert!(orchestrator.should_continue_after_failure(1, &retryable_with_fallback));
        assert!(!orchestrator.should_continue_after_failure(1, &non_retryable));
    }
}
