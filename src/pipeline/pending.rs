//! Artifacts on their way into the output repository

use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::Serialize;

use crate::domain::ArtifactIdentity;
use crate::storage::Checksum;

use super::error::PipelineError;
use super::task::{Task, TaskContext};

/// An artifact a planner wants published, paired with the task that
/// produces its file
#[derive(Debug, Clone)]
pub struct PendingArtifact {
    message: String,
    task: Rc<Task>,
    artifact: ArtifactIdentity,
}

impl PendingArtifact {
    pub fn new(message: impl Into<String>, task: Rc<Task>, artifact: ArtifactIdentity) -> Self {
        Self {
            message: message.into(),
            task,
            artifact,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn task(&self) -> &Rc<Task> {
        &self.task
    }

    pub fn artifact(&self) -> &ArtifactIdentity {
        &self.artifact
    }

    /// Produces the artifact's file.
    ///
    /// An already resolved task returns immediately and logs nothing.
    /// Otherwise the message is logged and the task runs one level deeper,
    /// so anything it logs is nested under the message.
    pub fn get(&self, cx: &TaskContext<'_>) -> Result<PathBuf, PipelineError> {
        if let Some(path) = self.task.get() {
            return Ok(path.to_path_buf());
        }

        cx.log.info(&self.message);
        let _scope = cx.log.push();
        self.task.execute(cx).map(Path::to_path_buf)
    }
}

/// An artifact published into the output repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputArtifact {
    pub file: PathBuf,
    pub artifact: ArtifactIdentity,
    pub checksums: Vec<Checksum>,
}
