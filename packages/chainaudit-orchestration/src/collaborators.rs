//! External collaborator interfaces
//!
//! The orchestration engine consumes these seams; production wiring
//! supplies adapters around real analyzer tooling, AI calls and storage.
//! In-memory implementations are provided interface-first for tests and
//! embedded use.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use chainaudit_core::{
    AnalysisOptions, AnalysisResult, ContractSource, CrossPlatformResult, PlatformId,
    Vulnerability,
};

use crate::error::{OrchestratorError, Result};
use crate::progress::RunProgress;
use crate::run::MultiPlatformRun;

/// Per-platform analyzer. May fail with an arbitrary error; the caller
/// classifies it at the boundary.
#[async_trait]
pub trait PlatformAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        contracts: &[ContractSource],
        options: &AnalysisOptions,
    ) -> anyhow::Result<AnalysisResult>;
}

/// Outcome of one AI contract analysis
#[derive(Debug, Clone, Default)]
pub struct AiOutcome {
    pub success: bool,
    pub vulnerabilities: Vec<Vulnerability>,
    pub error: Option<String>,
}

/// AI analysis collaborator used by the fallback engine's AI-only tier
#[async_trait]
pub trait AiAnalyzer: Send + Sync {
    async fn analyze_contract(&self, contract: &ContractSource, focus_areas: &[String])
        -> AiOutcome;
}

/// Structural validation report
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Structural/syntactic contract validation collaborator
#[async_trait]
pub trait ContractValidator: Send + Sync {
    async fn validate(&self, contract: &ContractSource) -> ValidationReport;
}

/// Run persistence collaborator
#[async_trait]
pub trait RunRepository: Send + Sync {
    async fn create_run(&self, run: &MultiPlatformRun) -> Result<()>;

    async fn update_run(&self, run: &MultiPlatformRun) -> Result<()>;

    async fn get_run(&self, id: Uuid) -> Result<Option<MultiPlatformRun>>;

    async fn record_vulnerabilities(
        &self,
        run_id: Uuid,
        platform: &PlatformId,
        vulnerabilities: &[Vulnerability],
    ) -> Result<()>;

    async fn record_cross_platform_result(
        &self,
        run_id: Uuid,
        result: &CrossPlatformResult,
    ) -> Result<()>;
}

/// Progress subscription channel. Fire-and-forget, at-most-once delivery is
/// acceptable - progress is always reconstructable from persisted state.
#[async_trait]
pub trait ProgressNotifier: Send + Sync {
    async fn notify(&self, owner: &str, run_id: Uuid, snapshot: &RunProgress);
}

/// Analyzer stub used when a platform has no analyzer wired. Always fails
/// with a transient unavailability so the fallback ladder can still run.
pub struct UnavailableAnalyzer {
    platform: PlatformId,
}

impl UnavailableAnalyzer {
    pub fn new(platform: PlatformId) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl PlatformAnalyzer for UnavailableAnalyzer {
    async fn analyze(
        &self,
        _contracts: &[ContractSource],
        _options: &AnalysisOptions,
    ) -> anyhow::Result<AnalysisResult> {
        anyhow::bail!("analyzer unavailable for platform {}", self.platform)
    }
}

/// In-memory run repository
#[derive(Default)]
pub struct InMemoryRunRepository {
    runs: DashMap<Uuid, MultiPlatformRun>,
    vulnerabilities: DashMap<Uuid, Vec<Vulnerability>>,
    cross_platform: DashMap<Uuid, CrossPlatformResult>,
}

impl InMemoryRunRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn recorded_vulnerabilities(&self, run_id: Uuid) -> Vec<Vulnerability> {
        self.vulnerabilities
            .get(&run_id)
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RunRepository for InMemoryRunRepository {
    async fn create_run(&self, run: &MultiPlatformRun) -> Result<()> {
        self.runs.insert(run.id, run.clone());
        Ok(())
    }

    async fn update_run(&self, run: &MultiPlatformRun) -> Result<()> {
        if !self.runs.contains_key(&run.id) {
            return Err(OrchestratorError::RunNotFound(run.id));
        }
        self.runs.insert(run.id, run.clone());
        Ok(())
    }

    async fn get_run(&self, id: Uuid) -> Result<Option<MultiPlatformRun>> {
        Ok(self.runs.get(&id).map(|r| r.clone()))
    }

    async fn record_vulnerabilities(
        &self,
        run_id: Uuid,
        _platform: &PlatformId,
        vulnerabilities: &[Vulnerability],
    ) -> Result<()> {
        self.vulnerabilities
            .entry(run_id)
            .or_default()
            .extend(vulnerabilities.iter().cloned());
        Ok(())
    }

    async fn record_cross_platform_result(
        &self,
        run_id: Uuid,
        result: &CrossPlatformResult,
    ) -> Result<()> {
        self.cross_platform.insert(run_id, result.clone());
        Ok(())
    }
}

/// Notifier that drops every snapshot
pub struct NoopNotifier;

#[async_trait]
impl ProgressNotifier for NoopNotifier {
    async fn notify(&self, _owner: &str, _run_id: Uuid, _snapshot: &RunProgress) {}
}
