//! Domain models for mavengen
//!
//! Artifact naming, version decoding and checksums, without any
//! scheduling or storage concerns.

mod artifact;
mod checksum;
mod version;

pub use artifact::{ArtifactError, ArtifactIdentity};
pub use checksum::ChecksumAlgorithm;
pub use version::{MarkerMatch, VersionError, VersionPolicy, VersionTriple};
