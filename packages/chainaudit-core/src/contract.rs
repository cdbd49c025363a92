//! Contract sources, analysis options and request validation
//!
//! An `AnalysisRequest` is the immutable input of a multi-platform run.
//! Contract fingerprints are the deterministic cache keys used by the
//! fallback engine's cached-results tier.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use thiserror::Error;

use crate::finding::Severity;
use crate::platform::{PlatformId, PlatformRegistry};

/// One contract submitted for analysis, tagged with its owning platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractSource {
    pub platform: PlatformId,
    pub filename: String,
    pub source: String,
}

impl ContractSource {
    pub fn new(
        platform: impl Into<PlatformId>,
        filename: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            platform: platform.into(),
            filename: filename.into(),
            source: source.into(),
        }
    }

    /// Deterministic content fingerprint over (platform, filename, source).
    ///
    /// Components are length-prefixed so that no concatenation of two
    /// different triples can collide.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for part in [
            self.platform.as_str(),
            self.filename.as_str(),
            self.source.as_str(),
        ] {
            hasher.update(part.len().to_le_bytes());
            hasher.update(part.as_bytes());
        }
        let digest = hasher.finalize();
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Analysis toggles shared by all sub-jobs of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub enable_static: bool,
    pub enable_ai: bool,
    pub severity_threshold: Severity,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            enable_static: true,
            enable_ai: true,
            severity_threshold: Severity::Informational,
        }
    }
}

/// Request validation failure
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestValidationError {
    #[error("Request names no platforms")]
    EmptyPlatforms,

    #[error("Request contains no contracts")]
    EmptyContracts,

    #[error("Unknown platform: {0}")]
    UnknownPlatform(PlatformId),

    #[error("Platform is not active: {0}")]
    InactivePlatform(PlatformId),

    #[error("Contract {filename} is tagged with platform {platform} which is not in the requested set")]
    ContractOutsideRequestedPlatforms {
        filename: String,
        platform: PlatformId,
    },

    #[error("Contract {0} has empty source")]
    EmptySource(String),
}

/// Immutable input of one multi-platform analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub platforms: Vec<PlatformId>,
    pub contracts: Vec<ContractSource>,
    #[serde(default)]
    pub options: AnalysisOptions,
    #[serde(default)]
    pub cross_platform: bool,
}

impl AnalysisRequest {
    /// Validate the request shape against the platform registry.
    ///
    /// Invariants: non-empty platform set, every contract tagged with a
    /// requested platform, every requested platform known and active,
    /// non-empty contract list and sources.
    pub fn validate(&self, registry: &PlatformRegistry) -> Result<(), RequestValidationError> {
        if self.platforms.is_empty() {
            return Err(RequestValidationError::EmptyPlatforms);
        }
        if self.contracts.is_empty() {
            return Err(RequestValidationError::EmptyContracts);
        }

        for platform in &self.platforms {
            if !registry.is_known(platform) {
                return Err(RequestValidationError::UnknownPlatform(platform.clone()));
            }
            if !registry.is_active(platform) {
                return Err(RequestValidationError::InactivePlatform(platform.clone()));
            }
        }

        let requested: HashSet<&PlatformId> = self.platforms.iter().collect();
        for contract in &self.contracts {
            if !requested.contains(&contract.platform) {
                return Err(RequestValidationError::ContractOutsideRequestedPlatforms {
                    filename: contract.filename.clone(),
                    platform: contract.platform.clone(),
                });
            }
            if contract.source.trim().is_empty() {
                return Err(RequestValidationError::EmptySource(contract.filename.clone()));
            }
        }

        Ok(())
    }

    /// Group contracts by their platform tag, preserving submission order
    pub fn contracts_by_platform(&self) -> Vec<(PlatformId, Vec<ContractSource>)> {
        let mut groups: Vec<(PlatformId, Vec<ContractSource>)> = Vec::new();
        for contract in &self.contracts {
            match groups.iter_mut().find(|(p, _)| *p == contract.platform) {
                Some((_, contracts)) => contracts.push(contract.clone()),
                None => groups.push((contract.platform.clone(), vec![contract.clone()])),
            }
        }
        groups
    }
}
