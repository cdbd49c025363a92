//! In-memory job queue with a bounded worker pool
//!
//! Interface-first implementation of the durable-queue collaborator: jobs
//! run on spawned tokio tasks, admission per job kind is bounded by a
//! semaphore, delayed jobs honor cancellation before they start, and
//! settlement is idempotent so duplicate completion observations are no-ops.

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{OrchestratorError, Result};
use crate::queue::{
    EnqueueOptions, JobHandle, JobKind, JobQueue, JobTypeCounts, QueueJobState, QueueStats,
};

/// Processor invoked for each dequeued job of a kind
pub type JobProcessor = Arc<
    dyn Fn(serde_json::Value) -> BoxFuture<'static, std::result::Result<serde_json::Value, String>>
        + Send
        + Sync,
>;

/// Worker-pool configuration
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub concurrency: HashMap<JobKind, usize>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        // Analyzer fan-out is bounded by available cores on small hosts
        let core_cap = num_cpus::get().max(1);
        let concurrency = JobKind::all()
            .into_iter()
            .map(|kind| (kind, kind.default_concurrency().min(core_cap)))
            .collect();
        Self { concurrency }
    }
}

struct JobRecord {
    kind: JobKind,
    #[allow(dead_code)]
    priority: i32,
    state: QueueJobState,
    return_value: Option<serde_json::Value>,
    failure: Option<String>,
    cancel: CancellationToken,
}

struct QueueInner {
    jobs: DashMap<Uuid, JobRecord>,
    processors: RwLock<HashMap<JobKind, JobProcessor>>,
    semaphores: HashMap<JobKind, Arc<Semaphore>>,
}

impl QueueInner {
    fn set_state(&self, id: Uuid, state: QueueJobState) {
        if let Some(mut record) = self.jobs.get_mut(&id) {
            if !record.state.is_settled() {
                record.state = state;
            }
        }
    }

    /// Idempotent settlement: the first outcome wins, duplicates are no-ops
    fn settle(
        &self,
        id: Uuid,
        outcome: std::result::Result<serde_json::Value, String>,
    ) {
        if let Some(mut record) = self.jobs.get_mut(&id) {
            if record.state.is_settled() {
                debug!(job_id = %id, "Duplicate settlement ignored");
                return;
            }
            match outcome {
                Ok(value) => {
                    record.state = QueueJobState::Completed;
                    record.return_value = Some(value);
                }
                Err(message) => {
                    record.state = QueueJobState::Failed;
                    record.failure = Some(message);
                }
            }
        }
    }
}

/// In-memory job queue backing the orchestrator in tests and embedded use
pub struct InMemoryJobQueue {
    inner: Arc<QueueInner>,
}

impl InMemoryJobQueue {
    pub fn new(config: QueueConfig) -> Self {
        let semaphores = JobKind::all()
            .into_iter()
            .map(|kind| {
                let permits = config
                    .concurrency
                    .get(&kind)
                    .copied()
                    .unwrap_or_else(|| kind.default_concurrency());
                (kind, Arc::new(Semaphore::new(permits.max(1))))
            })
            .collect();

        Self {
            inner: Arc::new(QueueInner {
                jobs: DashMap::new(),
                processors: RwLock::new(HashMap::new()),
                semaphores,
            }),
        }
    }

    /// Register the processor for a job kind. Must happen before jobs of
    /// that kind become active.
    pub fn register(&self, kind: JobKind, processor: JobProcessor) {
        self.inner.processors.write().insert(kind, processor);
    }

    fn spawn_worker(
        &self,
        id: Uuid,
        kind: JobKind,
        payload: serde_json::Value,
        delay: std::time::Duration,
        cancel: CancellationToken,
    ) {
        let inner = self.inner.clone();
        let semaphore = self
            .inner
            .semaphores
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Arc::new(Semaphore::new(1)));

        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        inner.settle(id, Err("job removed before execution".to_string()));
                        return;
                    }
                    _ = tokio::time::sleep(delay) => {
                        inner.set_state(id, QueueJobState::Waiting);
                    }
                }
            }

            let permit = tokio::select! {
                _ = cancel.cancelled() => {
                    inner.settle(id, Err("job removed before execution".to_string()));
                    return;
                }
                permit = semaphore.acquire_owned() => permit,
            };
            let _permit = match permit {
                Ok(p) => p,
                Err(_) => {
                    inner.settle(id, Err("worker pool shut down".to_string()));
                    return;
                }
            };

            if cancel.is_cancelled() {
                inner.settle(id, Err("job removed before execution".to_string()));
                return;
            }

            let processor = inner.processors.read().get(&kind).cloned();
            let processor = match processor {
                Some(p) => p,
                None => {
                    warn!(job_id = %id, kind = %kind, "No processor registered");
                    inner.settle(id, Err(format!("no processor registered for {}", kind)));
                    return;
                }
            };

            inner.set_state(id, QueueJobState::Active);
            debug!(job_id = %id, kind = %kind, "Job active");

            let outcome = processor(payload).await;
            inner.settle(id, outcome);
        });
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(
        &self,
        kind: JobKind,
        payload: serde_json::Value,
        opts: EnqueueOptions,
    ) -> Result<Box<dyn JobHandle>> {
        if !self.inner.processors.read().contains_key(&kind) {
            return Err(OrchestratorError::queue(format!(
                "no processor registered for {}",
                kind
            )));
        }

        let id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let initial_state = if opts.delay.is_zero() {
            QueueJobState::Waiting
        } else {
            QueueJobState::Delayed
        };

        self.inner.jobs.insert(
            id,
            JobRecord {
                kind,
                priority: opts.priority,
                state: initial_state,
                return_value: None,
                failure: None,
                cancel: cancel.clone(),
            },
        );

        self.spawn_worker(id, kind, payload, opts.delay, cancel);

        Ok(Box::new(InMemoryJobHandle {
            id,
            kind,
            inner: self.inner.clone(),
        }))
    }

    async fn stats(&self) -> QueueStats {
        let mut stats = QueueStats::default();
        for record in self.inner.jobs.iter() {
            let counts = stats.counts.entry(record.kind).or_insert(JobTypeCounts::default());
            match record.state {
                QueueJobState::Waiting | QueueJobState::Delayed => counts.waiting += 1,
                QueueJobState::Active => counts.active += 1,
                QueueJobState::Completed => counts.completed += 1,
                QueueJobState::Failed => counts.failed += 1,
            }
        }
        stats
    }
}

struct InMemoryJobHandle {
    id: Uuid,
    kind: JobKind,
    inner: Arc<QueueInner>,
}

#[async_trait]
impl JobHandle for InMemoryJobHandle {
    fn id(&self) -> Uuid {
        self.id
    }

    fn kind(&self) -> JobKind {
        self.kind
    }

    async fn state(&self) -> QueueJobState {
        self.inner
            .jobs
            .get(&self.id)
            .map(|record| record.state)
            .unwrap_or(QueueJobState::Failed)
    }

    async fn return_value(&self) -> Option<serde_json::Value> {
        self.inner
            .jobs
            .get(&self.id)
            .and_then(|record| record.return_value.clone())
    }

    async fn failure(&self) -> Option<String> {
        self.inner
            .jobs
            .get(&self.id)
            .and_then(|record| record.failure.clone())
    }

    async fn remove(&self) -> bool {
        let removable = self
            .inner
            .jobs
            .get(&self.id)
            .map(|record| {
                matches!(
                    record.state,
                    QueueJobState::Waiting | QueueJobState::Delayed
                )
            })
            .unwrap_or(false);

        if removable {
            if let Some(record) = self.inner.jobs.get(&self.id) {
                record.cancel.cancel();
            }
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn echo_processor() -> JobProcessor {
        Arc::new(|payload| Box::pin(async move { Ok(payload) }))
    }

    #[tokio::test]
    async fn test_job_completes_with_return_value() {
        let queue = InMemoryJobQueue::new(QueueConfig::default());
        queue.register(JobKind::PlatformAnalysis, echo_processor());

        let handle = queue
            .enqueue(
                JobKind::PlatformAnalysis,
                serde_json::json!({"platform": "ethereum"}),
                EnqueueOptions::default(),
            )
            .await
            .unwrap();

        // Poll until settled
        for _ in 0..100 {
            if handle.state().await.is_settled() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(handle.state().await, QueueJobState::Completed);
        assert_eq!(
            handle.return_value().await,
            Some(serde_json::json!({"platform": "ethereum"}))
        );
    }

    #[tokio::test]
    async fn test_failed_job_carries_failure() {
        let queue = InMemoryJobQueue::new(QueueConfig::default());
        queue.register(
            JobKind::PlatformAnalysis,
            Arc::new(|_| Box::pin(async { Err("analysis exploded".to_string()) })),
        );

        let handle = queue
            .enqueue(
                JobKind::PlatformAnalysis,
                serde_json::json!({}),
                EnqueueOptions::default(),
            )
            .await
            .unwrap();

        for _ in 0..100 {
            if handle.state().await.is_settled() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(handle.state().await, QueueJobState::Failed);
        assert_eq!(handle.failure().await, Some("analysis exploded".to_string()));
    }

    #[tokio::test]
    async fn test_concurrency_cap_respected() {
        let mut config = QueueConfig::default();
        config.concurrency.insert(JobKind::PlatformAnalysis, 2);
        let queue = InMemoryJobQueue::new(config);

        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let active_clone = active.clone();
        let peak_clone = peak.clone();

        queue.register(
            JobKind::PlatformAnalysis,
            Arc::new(move |_| {
                let active = active_clone.clone();
                let peak = peak_clone.clone();
                Box::pin(async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(serde_json::Value::Null)
                })
            }),
        );

        let mut handles = Vec::new();
        for _ in 0..6 {
            handles.push(
                queue
                    .enqueue(
                        JobKind::PlatformAnalysis,
                        serde_json::json!({}),
                        EnqueueOptions::default(),
                    )
                    .await
                    .unwrap(),
            );
        }

        for handle in &handles {
            for _ in 0..200 {
                if handle.state().await.is_settled() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }

        assert!(peak.load(Ordering::SeqCst) <= 2, "worker cap exceeded");
    }

    #[tokio::test]
    async fn test_delayed_job_can_be_removed() {
        let queue = InMemoryJobQueue::new(QueueConfig::default());
        queue.register(JobKind::PlatformAnalysis, echo_processor());

        let handle = queue
            .enqueue(
                JobKind::PlatformAnalysis,
                serde_json::json!({}),
                EnqueueOptions::default().with_delay(Duration::from_secs(60)),
            )
            .await
            .unwrap();

        assert_eq!(handle.state().await, QueueJobState::Delayed);
        assert!(handle.remove().await);

        for _ in 0..100 {
            if handle.state().await.is_settled() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(handle.state().await, QueueJobState::Failed);
        assert!(handle.failure().await.unwrap().contains("removed"));
    }

    #[tokio::test]
    async fn test_enqueue_without_processor_rejected() {
        let queue = InMemoryJobQueue::new(QueueConfig::default());
        let result = queue
            .enqueue(
                JobKind::CrossPlatformAnalysis,
                serde_json::json!({}),
                EnqueueOptions::default(),
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_stats_track_settlement() {
        let queue = InMemoryJobQueue::new(QueueConfig::default());
        queue.register(JobKind::PlatformAnalysis, echo_processor());

        let handle = queue
            .enqueue(
                JobKind::PlatformAnalysis,
                serde_json::json!({}),
                EnqueueOptions::default(),
            )
            .await
            .unwrap();

        for _ in 0..100 {
            if handle.state().await.is_settled() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let stats = queue.stats().await;
        assert_eq!(stats.for_kind(JobKind::PlatformAnalysis).completed, 1);
    }
}
