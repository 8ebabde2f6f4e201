//! Project management
//!
//! Handles project initialization and provides access to the output
//! repository and the cache.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::config::PROJECT_DIR;
use super::{Cache, Config, OutputRepository};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a mavengen project. Run 'mavengen init' first.")]
    NotInProject,

    #[error("No cache directory could be determined; set cache_dir or MAVENGEN_CACHE_DIR")]
    NoCacheDir,
}

const DEFAULT_CONFIG: &str = r#"# mavengen configuration

# Output repository, relative to the project root
output = "repo"

# Sidecar checksums written next to every published file
checksums = ["sha256"]

# Shared cache root (defaults to the user cache directory)
# cache_dir = ".mavengen/cache"

[version_policy]
forbidden_markers = ["nightly", "SNAPSHOT"]
marker_match = "substring"

# [modules.mappings]
# kind = "mappings"
# group = "org.example"
# minecraft = "1.12.2"
# source = "inputs/mappings-{timestamp}.zip"
#
# [modules.tools]
# kind = "bundle"
# group = "org.example"
#
# [[modules.tools.files]]
# source = "build/tools-{version}.jar"
"#;

/// A mavengen project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(PROJECT_DIR).is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let project_dir = root.join(PROJECT_DIR);

        fs::create_dir_all(&project_dir).with_context(|| {
            format!(
                "Failed to create {} directory: {}",
                PROJECT_DIR,
                project_dir.display()
            )
        })?;

        // An existing config is never overwritten
        let config_path = project_dir.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = project_dir.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(&gitignore_path, "# Local cache, if configured inside the project\ncache/\n")
                .with_context(|| {
                    format!("Failed to write .gitignore: {}", gitignore_path.display())
                })?;
        }

        Self::open(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .mavengen directory path
    pub fn project_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Output repository configured for this project
    pub fn output_repository(&self) -> Result<OutputRepository> {
        Ok(OutputRepository::new(
            self.config.output_dir()?,
            self.config.project.checksums.clone(),
        ))
    }

    /// Resolved cache root
    pub fn cache_dir(&self, override_dir: Option<&Path>) -> Result<PathBuf> {
        Ok(self
            .config
            .cache_dir(override_dir)
            .ok_or(ProjectError::NoCacheDir)?)
    }

    /// Opens the artifact cache, taking the writer lock
    pub fn open_cache(&self, override_dir: Option<&Path>) -> Result<Cache> {
        let dir = self.cache_dir(override_dir)?;
        Cache::open(&dir).with_context(|| format!("Failed to open cache: {}", dir.display()))
    }
}
