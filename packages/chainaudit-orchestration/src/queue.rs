//! Durable job queue interface
//!
//! The production queue is an external collaborator with at-least-once
//! delivery; this module defines the interface the orchestrator consumes.
//! `worker::InMemoryJobQueue` implements it for tests and embedded use.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

use crate::error::Result;

/// Job types consumed by the worker pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    /// Parent orchestration job, one per run
    MultiPlatformAnalysis,
    /// Platform-scoped analysis sub-job
    PlatformAnalysis,
    /// Cross-platform risk aggregation job
    CrossPlatformAnalysis,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::MultiPlatformAnalysis => "multi-platform-analysis",
            JobKind::PlatformAnalysis => "platform-analysis",
            JobKind::CrossPlatformAnalysis => "cross-platform-analysis",
        }
    }

    /// Default worker concurrency per kind. Platform sub-jobs run with
    /// higher parallelism than parent orchestration jobs, which are
    /// limited to bound resource use of shared analyzer tooling.
    pub fn default_concurrency(&self) -> usize {
        match self {
            JobKind::MultiPlatformAnalysis => 1,
            JobKind::PlatformAnalysis => 3,
            JobKind::CrossPlatformAnalysis => 1,
        }
    }

    pub fn all() -> [JobKind; 3] {
        [
            JobKind::MultiPlatformAnalysis,
            JobKind::PlatformAnalysis,
            JobKind::CrossPlatformAnalysis,
        ]
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Queue-level job state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueJobState {
    Waiting,
    Delayed,
    Active,
    Completed,
    Failed,
}

impl QueueJobState {
    pub fn is_settled(&self) -> bool {
        matches!(self, QueueJobState::Completed | QueueJobState::Failed)
    }
}

/// Enqueue options
#[derive(Debug, Clone, Copy, Default)]
pub struct EnqueueOptions {
    pub priority: i32,
    pub delay: Duration,
}

impl EnqueueOptions {
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Per-job-type queue counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobTypeCounts {
    pub waiting: usize,
    pub active: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Queue statistics across job types
#[derive(Debug, Clone, Default)]
pub struct QueueStats {
    pub counts: HashMap<JobKind, JobTypeCounts>,
}

impl QueueStats {
    pub fn for_kind(&self, kind: JobKind) -> JobTypeCounts {
        self.counts.get(&kind).copied().unwrap_or_default()
    }
}

/// Handle to one enqueued job
#[async_trait]
pub trait JobHandle: Send + Sync {
    fn id(&self) -> Uuid;

    fn kind(&self) -> JobKind;

    async fn state(&self) -> QueueJobState;

    /// Present once the job completed
    async fn return_value(&self) -> Option<serde_json::Value>;

    /// Present once the job failed
    async fn failure(&self) -> Option<String>;

    /// Remove a waiting/delayed job from the queue. Returns false when the
    /// job is already active or settled; running jobs are not interrupted.
    async fn remove(&self) -> bool;
}

/// Durable job queue interface (at-least-once delivery assumed)
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(
        &self,
        kind: JobKind,
        payload: serde_json::Value,
        opts: EnqueueOptions,
    ) -> Result<Box<dyn JobHandle>>;

    async fn stats(&self) -> QueueStats;
}
