//! Pipeline error kinds
//!
//! | Kind | Raised by | Retry? |
//! |------|-----------|--------|
//! | `InvalidVersion` | version parsing in a planner | no |
//! | `UnknownModule`, `InvalidModule` | the driver or a planner | no |
//! | `Computation` | a task's underlying work | yes, from scratch |
//! | `Generation` | `Repo::output` for one artifact | yes, copies are idempotent |
//! | `Cache` | cache index or object I/O | yes |

use thiserror::Error;

use crate::domain::{ArtifactError, ArtifactIdentity, VersionError};
use crate::storage::CacheError;

/// Boxed root cause carried by computation and generation failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidVersion(#[from] VersionError),

    #[error(transparent)]
    InvalidArtifact(#[from] ArtifactError),

    #[error("Unknown module '{0}'")]
    UnknownModule(String),

    #[error("Module '{module}' is misconfigured: {reason}")]
    InvalidModule { module: String, reason: String },

    #[error("Task '{task}' failed: {source}")]
    Computation {
        task: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to generate {artifact}: {source}")]
    Generation {
        artifact: ArtifactIdentity,
        #[source]
        source: BoxError,
    },

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl PipelineError {
    /// Whether running the same request again may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::Computation { .. }
                | PipelineError::Generation { .. }
                | PipelineError::Cache(_)
        )
    }

    /// The artifact a generation failure names
    pub fn artifact(&self) -> Option<&ArtifactIdentity> {
        match self {
            PipelineError::Generation { artifact, .. } => Some(artifact),
            _ => None,
        }
    }

    pub(crate) fn invalid_module(module: &str, reason: impl Into<String>) -> Self {
        PipelineError::InvalidModule {
            module: module.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn generation(artifact: &ArtifactIdentity, source: impl Into<BoxError>) -> Self {
        PipelineError::Generation {
            artifact: artifact.clone(),
            source: source.into(),
        }
    }
}
