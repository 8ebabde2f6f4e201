//! # Artifact Pipeline
//!
//! Turns a `(module, version)` request into published files.
//!
//! ```text
//! Driver::process(module, version)
//!   └── ArtifactPlanner::process        decides the artifacts
//!         └── Repo::output(pending)     publishes them in order
//!               └── PendingArtifact::get
//!                     └── Task::execute     cache hit, or compute + store
//! ```
//!
//! Everything here runs on one thread per `process` call. [`Task`] and
//! [`LogContext`] rely on interior mutability and are not `Sync`.

mod error;
mod log;
mod pending;
mod planner;
mod repo;
mod task;

pub use error::{BoxError, PipelineError};
pub use log::{LogContext, LogScope};
pub use pending::{OutputArtifact, PendingArtifact};
pub use planner::{ArtifactPlanner, Driver, PlanRequest};
pub use repo::Repo;
pub use task::{Task, TaskContext, TaskOutput};
