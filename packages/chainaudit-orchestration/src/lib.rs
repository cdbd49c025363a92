/*
 * Chainaudit Orchestration - Multi-Platform Analysis Engine
 *
 * Coordinates security analysis of smart-contract source across
 * independent blockchain platforms.
 *
 * Architecture:
 * - Run State Machine (pending -> analyzing -> completed/failed)
 * - Job Queue Fan-out/Fan-in (poll-based settlement, bounded waits)
 * - Fallback Degradation Ladder (primary -> AI-only -> validation ->
 *   cached -> minimal floor)
 * - Platform Error Classification (retryability + fallback metadata)
 * - Cross-Platform Risk Aggregation (bridge, consistency, interop,
 *   recommendations)
 */

// Public modules
pub mod aggregate;
pub mod cache;
pub mod classify;
pub mod collaborators;
pub mod error;
pub mod fallback;
pub mod orchestrator;
pub mod progress;
pub mod queue;
pub mod run;
pub mod worker;

// Re-exports
pub use aggregate::{AggregatorConfig, RiskAggregator};
pub use cache::{CachedAnalysis, ResultCache};
pub use classify::{classify, classify_error, PlatformError, PlatformErrorKind};
pub use collaborators::{
    AiAnalyzer, AiOutcome, ContractValidator, InMemoryRunRepository, NoopNotifier,
    PlatformAnalyzer, ProgressNotifier, RunRepository, UnavailableAnalyzer, ValidationReport,
};
pub use error::{OrchestratorError, Result};
pub use fallback::{
    FallbackAnalysisResult, FallbackAttempt, FallbackConfig, FallbackEngine,
};
pub use orchestrator::{
    AnalysisOrchestrator, CrossPlatformJobPayload, OrchestratorConfig, ParentJobPayload,
    PlatformJobPayload,
};
pub use progress::{fan_in_percent, milestones, ProgressTracker, RunProgress};
pub use queue::{
    EnqueueOptions, JobHandle, JobKind, JobQueue, JobTypeCounts, QueueJobState, QueueStats,
};
pub use run::{MultiPlatformRun, RunError, RunState, RunStateMachine};
pub use worker::{InMemoryJobQueue, JobProcessor, QueueConfig};

use std::sync::Arc;

/// Wire the orchestrator's processors into an in-memory queue. Must run
/// before the first `start_run`.
pub fn register_workers(queue: &InMemoryJobQueue, orchestrator: Arc<AnalysisOrchestrator>) {
    let orch = orchestrator.clone();
    queue.register(
        JobKind::MultiPlatformAnalysis,
        Arc::new(move |payload| {
            let orch = orch.clone();
            Box::pin(async move { orch.process_parent_job(payload).await })
        }),
    );

    let orch = orchestrator.clone();
    queue.register(
        JobKind::PlatformAnalysis,
        Arc::new(move |payload| {
            let orch = orch.clone();
            Box::pin(async move { orch.process_platform_job(payload).await })
        }),
    );

    let orch = orchestrator;
    queue.register(
        JobKind::CrossPlatformAnalysis,
        Arc::new(move |payload| {
            let orch = orch.clone();
            Box::pin(async move { orch.process_cross_platform_job(payload).await })
        }),
    );
}
