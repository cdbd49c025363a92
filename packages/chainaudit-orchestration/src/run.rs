use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use chainaudit_core::{AnalysisResult, CrossPlatformResult, PlatformId};

use crate::classify::PlatformError;
use crate::error::{OrchestratorError, Result};

/// Terminal failure attached to a failed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunError {
    /// Stable error code, e.g. "compilation-failure", "cancelled"
    pub code: String,
    pub message: String,
    pub recovery_suggestions: Vec<String>,
}

impl RunError {
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self {
            code: "cancelled".to_string(),
            message: reason.into(),
            recovery_suggestions: vec!["Submit a new analysis request".to_string()],
        }
    }

    pub fn all_platforms_failed(platform_count: usize) -> Self {
        Self {
            code: "all-platforms-failed".to_string(),
            message: format!("All {} platform sub-jobs failed", platform_count),
            recovery_suggestions: vec![
                "Inspect the per-platform errors in the progress snapshot".to_string(),
                "Contact support if the failure persists".to_string(),
            ],
        }
    }
}

impl From<PlatformError> for RunError {
    fn from(error: PlatformError) -> Self {
        Self {
            code: error.kind.as_str().to_string(),
            recovery_suggestions: error.recovery_suggestions(),
            message: error.to_string(),
        }
    }
}

/// Run state enum
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunState {
    Pending {
        submitted_at: DateTime<Utc>,
    },
    Analyzing {
        started_at: DateTime<Utc>,
    },
    Completed {
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        duration_ms: u64,
        platforms_succeeded: usize,
    },
    Failed {
        failed_at: DateTime<Utc>,
        error: RunError,
    },
}

impl RunState {
    pub fn state_name(&self) -> &'static str {
        match self {
            RunState::Pending { .. } => "pending",
            RunState::Analyzing { .. } => "analyzing",
            RunState::Completed { .. } => "completed",
            RunState::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed { .. } | RunState::Failed { .. })
    }
}

/// Aggregate root for one submitted multi-platform analysis request.
///
/// Exclusively owned and mutated by the orchestrator; progress-query
/// callers only read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiPlatformRun {
    pub id: Uuid,
    pub owner: String,
    pub platforms: Vec<PlatformId>,
    pub cross_platform: bool,
    pub state: RunState,
    /// Successful per-platform results, populated incrementally
    pub platform_results: HashMap<PlatformId, AnalysisResult>,
    pub cross_platform_result: Option<CrossPlatformResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MultiPlatformRun {
    pub fn new_pending(owner: String, platforms: Vec<PlatformId>, cross_platform: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner,
            platforms,
            cross_platform,
            state: RunState::Pending { submitted_at: now },
            platform_results: HashMap::new(),
            cross_platform_result: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Run state machine enforcing pending -> analyzing -> {completed | failed}
pub struct RunStateMachine {
    run: MultiPlatformRun,
}

impl RunStateMachine {
    pub fn new(run: MultiPlatformRun) -> Self {
        Self { run }
    }

    pub fn run(&self) -> &MultiPlatformRun {
        &self.run
    }

    pub fn into_run(self) -> MultiPlatformRun {
        self.run
    }

    /// Transition: PENDING -> ANALYZING
    pub fn start(&mut self) -> Result<()> {
        match &self.run.state {
            RunState::Pending { .. } => {
                let now = Utc::now();
                self.run.state = RunState::Analyzing { started_at: now };
                self.run.updated_at = now;
                Ok(())
            }
            _ => Err(OrchestratorError::InvalidStateTransition {
                from: self.run.state.state_name().to_string(),
                to: "analyzing".to_string(),
            }),
        }
    }

    /// Transition: ANALYZING -> COMPLETED
    pub fn complete(
        &mut self,
        results: HashMap<PlatformId, AnalysisResult>,
        cross_platform_result: Option<CrossPlatformResult>,
    ) -> Result<()> {
        match &self.run.state {
            RunState::Analyzing { started_at } => {
                let now = Utc::now();
                let duration_ms = (now - *started_at).num_milliseconds().max(0) as u64;

                self.run.state = RunState::Completed {
                    started_at: *started_at,
                    completed_at: now,
                    duration_ms,
                    platforms_succeeded: results.len(),
                };
                self.run.platform_results = results;
                self.run.cross_platform_result = cross_platform_result;
                self.run.updated_at = now;
                Ok(())
            }
            _ => Err(OrchestratorError::InvalidStateTransition {
                from: self.run.state.state_name().to_string(),
                to: "completed".to_string(),
            }),
        }
    }

    /// Transition: {PENDING | ANALYZING} -> FAILED
    pub fn fail(&mut self, error: RunError) -> Result<()> {
        if self.run.state.is_terminal() {
            return Err(OrchestratorError::InvalidStateTransition {
                from: self.run.state.state_name().to_string(),
                to: "failed".to_string(),
            });
        }

        let now = Utc::now();
        self.run.state = RunState::Failed {
            failed_at: now,
            error,
        };
        self.run.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_run() -> MultiPlatformRun {
        MultiPlatformRun::new_pending(
            "owner-1".to_string(),
            vec![PlatformId::new("ethereum"), PlatformId::new("solana")],
            true,
        )
    }

    #[test]
    fn test_transition_pending_to_analyzing() {
        let mut sm = RunStateMachine::new(pending_run());
        sm.start().unwrap();
        assert!(matches!(sm.run().state, RunState::Analyzing { .. }));
    }

    #[test]
    fn test_transition_analyzing_to_completed() {
        let mut sm = RunStateMachine::new(pending_run());
        sm.start().unwrap();

        let mut results = HashMap::new();
        results.insert(
            PlatformId::new("ethereum"),
            AnalysisResult::success(vec![], 100),
        );
        sm.complete(results, None).unwrap();

        match &sm.run().state {
            RunState::Completed {
                platforms_succeeded,
                ..
            } => assert_eq!(*platforms_succeeded, 1),
            _ => panic!("Expected Completed state"),
        }
    }

    #[test]
    fn test_cannot_complete_pending_run() {
        let mut sm = RunStateMachine::new(pending_run());
        let result = sm.complete(HashMap::new(), None);
        assert!(matches!(
            result,
            Err(OrchestratorError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_fail_from_pending_and_analyzing() {
        let mut sm = RunStateMachine::new(pending_run());
        sm.fail(RunError::cancelled("user requested")).unwrap();
        assert!(matches!(sm.run().state, RunState::Failed { .. }));

        let mut sm = RunStateMachine::new(pending_run());
        sm.start().unwrap();
        sm.fail(RunError::all_platforms_failed(2)).unwrap();
        assert!(sm.run().state.is_terminal());
    }

    #[test]
    fn test_cannot_fail_terminal_run() {
        let mut sm = RunStateMachine::new(pending_run());
        sm.start().unwrap();
        sm.complete(HashMap::new(), None).unwrap();

        let result = sm.fail(RunError::cancelled("too late"));
        assert!(result.is_err());
    }

    #[test]
    fn test_run_error_from_platform_error() {
        use crate::classify::{PlatformError, PlatformErrorKind};

        let platform_error = PlatformError::new(PlatformErrorKind::CompilationFailure, "bad code")
            .for_platform(PlatformId::new("ethereum"));
        let run_error = RunError::from(platform_error);

        assert_eq!(run_error.code, "compilation-failure");
        assert!(!run_error.recovery_suggestions.is_empty());
    }
}
