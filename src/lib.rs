//! mavengen - generates, caches and publishes modding toolchain artifacts
//!
//! A `(module, version)` request is planned into a set of artifacts, each
//! produced by a memoized [`pipeline::Task`] backed by a persistent
//! [`storage::Cache`], and published into a local directory laid out like a
//! Maven repository with checksum sidecars and `maven-metadata.xml`.
//!
//! Mapping versions follow a composite grammar decoded by
//! [`domain::VersionTriple`].

pub mod cli;
pub mod domain;
pub mod modules;
pub mod pipeline;
pub mod storage;

pub use domain::{ArtifactIdentity, ChecksumAlgorithm, VersionPolicy, VersionTriple};
pub use pipeline::{Driver, PipelineError, Repo};
