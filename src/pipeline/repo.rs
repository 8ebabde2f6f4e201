//! Orchestration of pending artifacts into the output repository

use std::path::Path;
use std::rc::Rc;

use tempfile::TempDir;
use tracing::debug;

use crate::domain::ArtifactIdentity;
use crate::storage::{Cache, OutputRepository, PublishedFile};

use super::error::PipelineError;
use super::log::LogContext;
use super::pending::{OutputArtifact, PendingArtifact};
use super::task::{Task, TaskContext};

/// Handle a planner uses to publish artifacts.
///
/// Owns the output repository, the optional cache, the log context for the
/// current `process` call and a scratch directory that computations write
/// into. The scratch directory is removed when the `Repo` drops.
pub struct Repo {
    repository: OutputRepository,
    cache: Option<Cache>,
    log: LogContext,
    scratch: TempDir,
}

impl Repo {
    pub fn new(repository: OutputRepository, cache: Option<Cache>) -> std::io::Result<Self> {
        Ok(Self {
            repository,
            cache,
            log: LogContext::new(),
            scratch: tempfile::Builder::new().prefix("mavengen-").tempdir()?,
        })
    }

    pub fn repository(&self) -> &OutputRepository {
        &self.repository
    }

    pub fn cache(&self) -> Option<&Cache> {
        self.cache.as_ref()
    }

    pub fn log(&self) -> &LogContext {
        &self.log
    }

    pub fn work_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Context handed to task computations
    pub fn context(&self) -> TaskContext<'_> {
        TaskContext {
            cache: self.cache.as_ref(),
            log: &self.log,
            work_dir: self.scratch.path(),
        }
    }

    /// Pairs a task with the artifact it produces
    pub fn pending(
        &self,
        message: impl Into<String>,
        task: Rc<Task>,
        artifact: ArtifactIdentity,
    ) -> PendingArtifact {
        PendingArtifact::new(message, task, artifact)
    }

    /// Publishes each pending artifact in order.
    ///
    /// Stops at the first failure and reports it against the artifact being
    /// published. Artifacts already published stay in place with valid
    /// sidecars.
    pub fn output(
        &self,
        pending: &[PendingArtifact],
    ) -> Result<Vec<OutputArtifact>, PipelineError> {
        let cx = self.context();
        let mut outputs = Vec::with_capacity(pending.len());

        for item in pending {
            let artifact = item.artifact();
            let file = item
                .get(&cx)
                .map_err(|err| PipelineError::generation(artifact, err))?;

            let published = self
                .repository
                .publish(&file, artifact)
                .map_err(|err| PipelineError::generation(artifact, err))?;
            debug!(artifact = %artifact, path = %published.path.display(), "published");

            outputs.push(OutputArtifact {
                file: published.path,
                artifact: artifact.clone(),
                checksums: published.checksums,
            });
        }

        Ok(outputs)
    }

    /// Rewrites `maven-metadata.xml` for the artifact's group and name
    pub fn update_metadata(
        &self,
        artifact: &ArtifactIdentity,
    ) -> Result<PublishedFile, PipelineError> {
        self.repository
            .update_metadata(artifact)
            .map_err(|err| PipelineError::generation(artifact, err))
    }
}

impl std::fmt::Debug for Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repo")
            .field("repository", &self.repository)
            .field("cached", &self.cache.is_some())
            .field("work_dir", &self.scratch.path())
            .finish()
    }
}
