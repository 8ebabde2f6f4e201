//! Deferred, memoized computations
//!
//! A [`Task`] wraps a computation that produces a file. It is either
//! unresolved or resolved to a [`TaskOutput`]; the transition happens on the
//! first successful [`Task::execute`] and is permanent for the process.
//!
//! Before running, a cached task asks the [`Cache`] for its key. On a hit it
//! resolves without doing any work; on a miss it runs, stores the result
//! under its key and resolves to the stored copy. A failed run leaves the
//! task unresolved and stores nothing, so a later `execute` retries.
//!
//! Tasks are shared between artifacts with `Rc<Task>`: a computation that
//! depends on another task captures it and calls `execute` on it.
//!
//! Each task computes inside its own scratch subdirectory, and must leave a
//! regular file at the path it returns.

use std::cell::{Cell, OnceCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::ChecksumAlgorithm;
use crate::storage::{Cache, CacheKey};

use super::error::PipelineError;
use super::log::LogContext;

/// Everything a computation may use while running
#[derive(Clone, Copy)]
pub struct TaskContext<'a> {
    pub cache: Option<&'a Cache>,
    pub log: &'a LogContext,
    pub work_dir: &'a Path,
}

impl TaskContext<'_> {
    /// Path for a scratch file, creating the scratch directory if needed
    pub fn scratch_path(&self, name: &str) -> std::io::Result<PathBuf> {
        fs::create_dir_all(self.work_dir)?;
        Ok(self.work_dir.join(name))
    }

    /// Writes a scratch file and returns its path
    pub fn write_scratch(&self, name: &str, contents: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.scratch_path(name)?;
        fs::write(&path, contents)?;
        Ok(path)
    }
}

type Computation = Box<dyn Fn(&TaskContext<'_>) -> anyhow::Result<PathBuf>>;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(0);

fn next_task_id() -> u64 {
    NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed)
}

/// Result of a resolved task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutput {
    pub path: PathBuf,
    pub sha256: String,

    /// Resolved from the cache without running the computation
    pub cache_hit: bool,
}

/// A unit of deferred, memoized work
pub struct Task {
    id: u64,
    name: String,
    key: Option<CacheKey>,
    compute: Computation,
    output: OnceCell<TaskOutput>,
    running: Cell<bool>,
}

impl Task {
    /// Creates a task whose result is persisted in the cache under `key`
    pub fn new<F>(name: impl Into<String>, key: CacheKey, compute: F) -> Self
    where
        F: Fn(&TaskContext<'_>) -> anyhow::Result<PathBuf> + 'static,
    {
        Self {
            id: next_task_id(),
            name: name.into(),
            key: Some(key),
            compute: Box::new(compute),
            output: OnceCell::new(),
            running: Cell::new(false),
        }
    }

    /// Creates a task that is only memoized in-process
    pub fn uncached<F>(name: impl Into<String>, compute: F) -> Self
    where
        F: Fn(&TaskContext<'_>) -> anyhow::Result<PathBuf> + 'static,
    {
        Self {
            id: next_task_id(),
            name: name.into(),
            key: None,
            compute: Box::new(compute),
            output: OnceCell::new(),
            running: Cell::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> Option<&CacheKey> {
        self.key.as_ref()
    }

    /// True once the task has produced its file in this process
    pub fn resolved(&self) -> bool {
        self.output.get().is_some()
    }

    /// The resolved file, or `None` while unresolved
    pub fn get(&self) -> Option<&Path> {
        self.output.get().map(|o| o.path.as_path())
    }

    /// Full result of the resolved task
    pub fn output(&self) -> Option<&TaskOutput> {
        self.output.get()
    }

    /// Resolves the task, running the computation at most once on success
    pub fn execute(&self, cx: &TaskContext<'_>) -> Result<&Path, PipelineError> {
        if let Some(output) = self.output.get() {
            return Ok(&output.path);
        }

        if self.running.replace(true) {
            return Err(self.failure(anyhow::anyhow!("task depends on itself")));
        }
        let resolved = self.resolve(cx);
        self.running.set(false);

        let output = resolved?;
        Ok(&self.output.get_or_init(|| output).path)
    }

    fn resolve(&self, cx: &TaskContext<'_>) -> Result<TaskOutput, PipelineError> {
        if let (Some(key), Some(cache)) = (&self.key, cx.cache) {
            if let Some(hit) = cache.get(key)? {
                cx.log.debug(&format!("{}: cache hit", self.name));
                return Ok(TaskOutput {
                    path: hit.path,
                    sha256: hit.sha256,
                    cache_hit: true,
                });
            }
        }

        let work_dir = cx.work_dir.join(format!("task-{}", self.id));
        let own = TaskContext {
            work_dir: &work_dir,
            ..*cx
        };
        let produced = (self.compute)(&own).map_err(|err| self.failure(err))?;
        if !produced.is_file() {
            return Err(self.failure(anyhow::anyhow!(
                "no file was produced at {}",
                produced.display()
            )));
        }

        match (&self.key, cx.cache) {
            (Some(key), Some(cache)) => {
                let stored = cache.put(key, &produced)?;
                Ok(TaskOutput {
                    path: stored.path,
                    sha256: stored.sha256,
                    cache_hit: false,
                })
            }
            _ => {
                let sha256 = ChecksumAlgorithm::Sha256
                    .hash_file(&produced)
                    .map_err(|err| self.failure(err.into()))?;
                Ok(TaskOutput {
                    path: produced,
                    sha256,
                    cache_hit: false,
                })
            }
        }
    }

    fn failure(&self, err: anyhow::Error) -> PipelineError {
        PipelineError::Computation {
            task: self.name.clone(),
            source: err.into(),
        }
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("output", &self.output.get())
            .finish_non_exhaustive()
    }
}
