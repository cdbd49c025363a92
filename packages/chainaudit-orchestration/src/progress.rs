//! Run progress tracking
//!
//! `RunProgress` is an ephemeral, reconstructable view - never the source
//! of truth. The tracker is an injected per-process service; only the
//! polling loop that owns a run writes its entry (single-writer per run),
//! so concurrent sub-job completions cannot lose updates.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use chainaudit_core::PlatformId;

use crate::run::{MultiPlatformRun, RunState};

/// Fixed progress milestones. Settled sub-jobs scale into the 10-80 band.
pub mod milestones {
    pub const INITIALIZED: u8 = 5;
    pub const SUB_JOBS_ENQUEUED: u8 = 10;
    pub const FAN_IN_CEILING: u8 = 80;
    pub const PLATFORMS_SETTLED: u8 = 85;
    pub const CROSS_PLATFORM_SETTLED: u8 = 90;
    pub const FINALIZED: u8 = 100;
}

/// Progress percentage for a partially settled fan-in, scaled into the
/// 10-80 band
pub fn fan_in_percent(settled: usize, total: usize) -> u8 {
    let total = total.max(1);
    let settled = settled.min(total);
    let span = (milestones::FAN_IN_CEILING - milestones::SUB_JOBS_ENQUEUED) as usize;
    milestones::SUB_JOBS_ENQUEUED + (settled * span / total) as u8
}

/// Ephemeral per-run progress snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunProgress {
    pub run_id: Uuid,
    pub overall_percent: u8,
    pub platform_percent: HashMap<PlatformId, u8>,
    pub current_step: String,
    pub completed_platforms: Vec<PlatformId>,
    pub failed_platforms: Vec<PlatformId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recovery_suggestions: Vec<String>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_at: Option<DateTime<Utc>>,
}

impl RunProgress {
    fn initial(run_id: Uuid, platforms: &[PlatformId]) -> Self {
        Self {
            run_id,
            overall_percent: milestones::INITIALIZED,
            platform_percent: platforms.iter().map(|p| (p.clone(), 0)).collect(),
            current_step: "initialization".to_string(),
            completed_platforms: Vec::new(),
            failed_platforms: Vec::new(),
            error: None,
            recovery_suggestions: Vec::new(),
            updated_at: Utc::now(),
            terminal_at: None,
        }
    }

    /// Deterministic reconstruction from the persisted run. Same inputs
    /// always produce the same snapshot (timestamps aside).
    pub fn reconstruct(run: &MultiPlatformRun) -> Self {
        let completed: Vec<PlatformId> = {
            let mut platforms: Vec<PlatformId> =
                run.platform_results.keys().cloned().collect();
            platforms.sort();
            platforms
        };

        let mut snapshot = Self::initial(run.id, &run.platforms);
        for platform in &completed {
            snapshot.platform_percent.insert(platform.clone(), 100);
        }
        snapshot.completed_platforms = completed.clone();

        match &run.state {
            RunState::Pending { .. } => {
                snapshot.overall_percent = milestones::INITIALIZED;
                snapshot.current_step = "pending".to_string();
            }
            RunState::Analyzing { .. } => {
                snapshot.overall_percent = fan_in_percent(completed.len(), run.platforms.len());
                snapshot.current_step = "analyzing platforms".to_string();
            }
            RunState::Completed { .. } => {
                snapshot.overall_percent = milestones::FINALIZED;
                snapshot.current_step = "completed".to_string();
                snapshot.failed_platforms = run
                    .platforms
                    .iter()
                    .filter(|p| !run.platform_results.contains_key(*p))
                    .cloned()
                    .collect();
                for platform in &snapshot.failed_platforms {
                    snapshot.platform_percent.insert(platform.clone(), 100);
                }
                snapshot.terminal_at = Some(run.updated_at);
            }
            RunState::Failed { error, .. } => {
                snapshot.overall_percent = milestones::FINALIZED;
                snapshot.current_step = "failed".to_string();
                snapshot.failed_platforms = run
                    .platforms
                    .iter()
                    .filter(|p| !run.platform_results.contains_key(*p))
                    .cloned()
                    .collect();
                snapshot.error = Some(error.message.clone());
                snapshot.recovery_suggestions = error.recovery_suggestions.clone();
                snapshot.terminal_at = Some(run.updated_at);
            }
        }

        snapshot
    }
}

/// Injected progress store with bounded retention for terminal runs
pub struct ProgressTracker {
    entries: DashMap<Uuid, RunProgress>,
    retention: Duration,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}

impl ProgressTracker {
    pub fn new(retention: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            retention,
        }
    }

    /// Create the initial snapshot for a starting run
    pub fn start(&self, run_id: Uuid, platforms: &[PlatformId]) {
        self.entries
            .insert(run_id, RunProgress::initial(run_id, platforms));
    }

    /// Apply an update. The overall percentage is merged with `max()` so it
    /// never regresses, regardless of sub-job settlement order.
    pub fn update<F>(&self, run_id: Uuid, apply: F)
    where
        F: FnOnce(&mut RunProgress),
    {
        if let Some(mut entry) = self.entries.get_mut(&run_id) {
            let floor = entry.overall_percent;
            apply(&mut entry);
            entry.overall_percent = entry.overall_percent.max(floor);
            entry.updated_at = Utc::now();
        }
    }

    /// Mark the run terminal, starting the retention clock
    pub fn mark_terminal(&self, run_id: Uuid) {
        if let Some(mut entry) = self.entries.get_mut(&run_id) {
            entry.terminal_at = Some(Utc::now());
        }
    }

    pub fn get(&self, run_id: Uuid) -> Option<RunProgress> {
        self.entries.get(&run_id).map(|e| e.clone())
    }

    /// Drop terminal entries older than the retention period
    pub fn gc(&self) {
        let now = Utc::now();
        self.entries.retain(|_, entry| match entry.terminal_at {
            Some(terminal_at) => now - terminal_at <= self.retention,
            None => true,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
