/*
 * Chainaudit Core - Shared Domain Model
 *
 * Platform, contract, finding and result types shared between the
 * orchestration engine and its collaborators.
 *
 * - Platform registry (execution models, active flags)
 * - Contract sources with deterministic content fingerprints
 * - Vulnerability findings (severity, confidence, origin)
 * - Per-platform analysis results with fallback metadata
 * - Cross-platform risk report types
 */

// Public modules
pub mod contract;
pub mod crosschain;
pub mod finding;
pub mod platform;
pub mod result;

// Re-exports
pub use contract::{AnalysisOptions, AnalysisRequest, ContractSource, RequestValidationError};
pub use crosschain::{
    BridgeSecurityAssessment, ConsistencyIssue, CrossChainRecommendation, CrossPlatformResult,
    InteroperabilityRisk, RecommendationPriority, StateConsistencyReport,
};
pub use finding::{AnalysisOrigin, Confidence, Location, Severity, Vulnerability};
pub use platform::{ExecutionModel, Platform, PlatformId, PlatformRegistry};
pub use result::{AnalysisMetadata, AnalysisResult, DegradationLevel, FallbackStrategy};
