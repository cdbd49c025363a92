use thiserror::Error;

use crate::classify::PlatformError;

pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Run not found: {0}")]
    RunNotFound(uuid::Uuid),

    #[error("Access denied for run {0}")]
    AccessDenied(uuid::Uuid),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Validation error: {0}")]
    Validation(#[from] chainaudit_core::RequestValidationError),

    #[error("Run cancelled: {0}")]
    Cancelled(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Platform error: {0}")]
    Platform(PlatformError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OrchestratorError {
    pub fn queue<E: std::fmt::Display>(e: E) -> Self {
        Self::Queue(e.to_string())
    }

    pub fn serialization<E: std::fmt::Display>(e: E) -> Self {
        Self::Serialization(e.to_string())
    }

    pub fn persistence<E: std::fmt::Display>(e: E) -> Self {
        Self::Persistence(e.to_string())
    }
}

impl From<PlatformError> for OrchestratorError {
    fn from(e: PlatformError) -> Self {
        Self::Platform(e)
    }
}
