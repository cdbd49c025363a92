//! Platform error classification
//!
//! Every failure crossing the orchestrator/fallback boundary is classified
//! into a typed `PlatformError`; raw errors never propagate past it.
//! Classification is pure - callers own logging and reporting.

use serde::{Deserialize, Serialize};

use chainaudit_core::PlatformId;

/// Fixed enumeration of platform error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformErrorKind {
    CompilationFailure,
    ToolMissing,
    ToolVersionIncompatible,
    ToolTimeout,
    ValidationFailure,
    AnalyzerUnavailable,
    CrossPlatformAnalysisFailure,
    PlatformNotSupported,
}

impl PlatformErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformErrorKind::CompilationFailure => "compilation-failure",
            PlatformErrorKind::ToolMissing => "tool-missing",
            PlatformErrorKind::ToolVersionIncompatible => "tool-version-incompatible",
            PlatformErrorKind::ToolTimeout => "tool-timeout",
            PlatformErrorKind::ValidationFailure => "validation-failure",
            PlatformErrorKind::AnalyzerUnavailable => "analyzer-unavailable",
            PlatformErrorKind::CrossPlatformAnalysisFailure => "cross-platform-analysis-failure",
            PlatformErrorKind::PlatformNotSupported => "platform-not-supported",
        }
    }

    /// Static retryability lookup: timeouts and transient unavailability
    /// retry, compilation/validation never do
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PlatformErrorKind::ToolTimeout
                | PlatformErrorKind::AnalyzerUnavailable
                | PlatformErrorKind::CrossPlatformAnalysisFailure
        )
    }

    /// Whether degraded analysis tiers can still produce a useful result.
    /// Uncompilable or invalid input defeats every tier; missing or broken
    /// tooling does not.
    pub fn fallback_available(&self) -> bool {
        matches!(
            self,
            PlatformErrorKind::ToolMissing
                | PlatformErrorKind::ToolVersionIncompatible
                | PlatformErrorKind::ToolTimeout
                | PlatformErrorKind::AnalyzerUnavailable
        )
    }

    /// HTTP-equivalent status class for API surfaces
    pub fn http_status(&self) -> u16 {
        match self {
            PlatformErrorKind::ValidationFailure | PlatformErrorKind::PlatformNotSupported => 400,
            PlatformErrorKind::CompilationFailure => 422,
            PlatformErrorKind::ToolMissing
            | PlatformErrorKind::ToolVersionIncompatible
            | PlatformErrorKind::AnalyzerUnavailable => 503,
            PlatformErrorKind::ToolTimeout => 504,
            PlatformErrorKind::CrossPlatformAnalysisFailure => 500,
        }
    }
}

impl std::fmt::Display for PlatformErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed platform failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformError {
    pub kind: PlatformErrorKind,
    pub message: String,
    /// Owning platform; cross-platform errors carry `platforms` instead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<PlatformId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<PlatformId>,
    pub retryable: bool,
    pub fallback_available: bool,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub context: serde_json::Map<String, serde_json::Value>,
}

impl PlatformError {
    pub fn new(kind: PlatformErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            platform: None,
            platforms: Vec::new(),
            retryable: kind.is_retryable(),
            fallback_available: kind.fallback_available(),
            context: serde_json::Map::new(),
        }
    }

    pub fn for_platform(mut self, platform: PlatformId) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn for_platforms(mut self, platforms: Vec<PlatformId>) -> Self {
        self.platforms = platforms;
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// Recovery guidance surfaced with terminal failures
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self.kind {
            PlatformErrorKind::CompilationFailure => vec![
                "Fix the compilation errors reported for the contract source".to_string(),
                "Verify the contract targets a compiler version the platform supports".to_string(),
            ],
            PlatformErrorKind::ToolMissing => vec![
                "Install the platform analyzer toolchain on the worker host".to_string(),
                "Retry with AI-only analysis enabled".to_string(),
            ],
            PlatformErrorKind::ToolVersionIncompatible => vec![
                "Upgrade the analyzer tool to a supported version".to_string(),
            ],
            PlatformErrorKind::ToolTimeout => vec![
                "Retry the analysis; the tool exceeded its time budget".to_string(),
                "Split large contracts into smaller submissions".to_string(),
            ],
            PlatformErrorKind::ValidationFailure => vec![
                "Check the request shape: platforms, contract tags and source texts".to_string(),
            ],
            PlatformErrorKind::AnalyzerUnavailable => vec![
                "Retry later; the platform analyzer is temporarily unavailable".to_string(),
            ],
            PlatformErrorKind::CrossPlatformAnalysisFailure => vec![
                "Per-platform results are unaffected; re-run to retry the cross-platform stage"
                    .to_string(),
            ],
            PlatformErrorKind::PlatformNotSupported => vec![
                "Remove the unsupported platform from the request".to_string(),
                "Contact support to request platform onboarding".to_string(),
            ],
        }
    }
}

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.platform {
            Some(platform) => write!(f, "[{}] {}: {}", platform, self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// Classify a raw failure message into a typed platform error.
///
/// Sub-job failure strings are serialized `PlatformError` JSON where
/// possible; those decode directly. Everything else goes through substring
/// heuristics, defaulting to a retryable analyzer-unavailable error.
pub fn classify(raw: &str, platform: Option<&PlatformId>) -> PlatformError {
    if let Ok(mut decoded) = serde_json::from_str::<PlatformError>(raw) {
        if decoded.platform.is_none() {
            decoded.platform = platform.cloned();
        }
        return decoded;
    }

    let lowered = raw.to_lowercase();

    let kind = if lowered.contains("not supported") || lowered.contains("unsupported platform") {
        PlatformErrorKind::PlatformNotSupported
    } else if lowered.contains("timeout") || lowered.contains("timed out") {
        PlatformErrorKind::ToolTimeout
    } else if lowered.contains("version") && lowered.contains("incompatible") {
        PlatformErrorKind::ToolVersionIncompatible
    } else if lowered.contains("not found")
        || lowered.contains("not installed")
        || lowered.contains("no such file")
        || lowered.contains("command not found")
    {
        PlatformErrorKind::ToolMissing
    } else if lowered.contains("compil")
        || lowered.contains("syntax error")
        || lowered.contains("parse error")
    {
        PlatformErrorKind::CompilationFailure
    } else if lowered.contains("validation") || lowered.contains("invalid request") {
        PlatformErrorKind::ValidationFailure
    } else if lowered.contains("cross-platform") || lowered.contains("cross platform") {
        PlatformErrorKind::CrossPlatformAnalysisFailure
    } else {
        PlatformErrorKind::AnalyzerUnavailable
    };

    let mut error = PlatformError::new(kind, raw);
    error.platform = platform.cloned();
    error
}

/// Classify an arbitrary boundary error
pub fn classify_error(error: &anyhow::Error, platform: Option<&PlatformId>) -> PlatformError {
    classify(&error.to_string(), platform)
}
