//! # Storage Layer
//!
//! Everything mavengen keeps on disk.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Config | TOML | `.mavengen/config.toml` |
//! | Cache index | SQLite | `<cache_dir>/index.db` |
//! | Cached files | plain files | `<cache_dir>/objects/` |
//! | Published artifacts | Maven layout + sidecars | `<output>/` |
//!
//! ## Concurrency Safety
//!
//! - [`Cache`] takes an exclusive `fs2` lock; one writer per cache root
//! - All writes into the cache and the output repository are atomic
//!   (temp file + rename)
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for a mavengen project
//! - [`Cache`] - Persistent key to file store
//! - [`OutputRepository`] - Maven-layout output directory
//! - [`Config`] - Project and global configuration

mod cache;
mod config;
mod project;
mod repository;

pub use cache::{Cache, CacheEntry, CacheError, CacheKey, CacheStats, CachedFile};
pub use config::{
    BundleFile, Config, ConfigError, GlobalConfig, ModuleConfig, ModuleKind, ProjectConfig,
    CACHE_DIR_ENV, PROJECT_DIR,
};
pub use project::{Project, ProjectError};
pub use repository::{compare_versions, Checksum, OutputRepository, PublishedFile};
pub(crate) use repository::xml_escape;
