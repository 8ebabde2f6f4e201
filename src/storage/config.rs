//! Configuration handling for mavengen
//!
//! Configuration is stored in `.mavengen/config.toml` (project) and
//! `~/.config/mavengen/config.toml` (global).
//!
//! ```toml
//! output = "repo"
//! checksums = ["sha256", "sha512"]
//!
//! [version_policy]
//! forbidden_markers = ["nightly", "SNAPSHOT"]
//! marker_match = "substring"
//!
//! [modules.mappings]
//! kind = "mappings"
//! group = "org.example"
//! minecraft = "1.12.2"
//! source = "inputs/mappings-{timestamp}.zip"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ChecksumAlgorithm, VersionPolicy};

/// Name of the per-project directory
pub const PROJECT_DIR: &str = ".mavengen";

/// Environment variable overriding the cache directory
pub const CACHE_DIR_ENV: &str = "MAVENGEN_CACHE_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Planner family a module is generated by
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    /// Versioned mapping archives using the composite version grammar
    Mappings,
    /// A fixed set of files published under an opaque version
    Bundle,
}

impl ModuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Mappings => "mappings",
            ModuleKind::Bundle => "bundle",
        }
    }
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_extension() -> String {
    "jar".to_string()
}

/// One file of a bundle module
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BundleFile {
    /// Path template of the input file
    pub source: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,

    #[serde(default = "default_extension")]
    pub extension: String,
}

/// A `[modules.<name>]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleConfig {
    pub kind: ModuleKind,

    /// Maven group id
    pub group: String,

    /// Maven artifact id (defaults to the module name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,

    /// Platform version applied when a mapping version names none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minecraft: Option<String>,

    /// Path template of the main input (mappings modules)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,

    /// Extension of the main artifact (mappings modules, default `zip`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,

    /// Files published by bundle modules
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<BundleFile>,

    /// Written into the generated POM
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ModuleConfig {
    /// Maven artifact id for the module
    pub fn artifact_name<'a>(&'a self, module: &'a str) -> &'a str {
        self.artifact.as_deref().unwrap_or(module)
    }

    /// Checks the fields the module's kind requires
    pub fn validate(&self, module: &str) -> Result<(), ConfigError> {
        if self.group.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "module '{}' has an empty group",
                module
            )));
        }

        match self.kind {
            ModuleKind::Mappings if self.source.is_none() => Err(ConfigError::Invalid(format!(
                "mappings module '{}' needs a source",
                module
            ))),
            ModuleKind::Bundle if self.files.is_empty() => Err(ConfigError::Invalid(format!(
                "bundle module '{}' lists no files",
                module
            ))),
            _ => Ok(()),
        }
    }
}

fn default_checksums() -> Vec<ChecksumAlgorithm> {
    vec![ChecksumAlgorithm::Sha256]
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Output repository root, relative to the project root
    pub output: Option<PathBuf>,

    /// Cache root, relative to the project root
    pub cache_dir: Option<PathBuf>,

    /// Sidecar algorithms written next to every published file
    pub checksums: Vec<ChecksumAlgorithm>,

    pub version_policy: VersionPolicy,

    pub modules: BTreeMap<String, ModuleConfig>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            output: None,
            cache_dir: None,
            checksums: default_checksums(),
            version_policy: VersionPolicy::default(),
            modules: BTreeMap::new(),
        }
    }
}

impl ProjectConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.checksums.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one checksum algorithm is required".to_string(),
            ));
        }
        for (name, module) in &self.modules {
            module.validate(name)?;
            if let Some(minecraft) = &module.minecraft {
                self.version_policy.check_platform(minecraft).map_err(|err| {
                    ConfigError::Invalid(format!("module '{}': {}", name, err))
                })?;
            }
        }
        Ok(())
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Shared cache root used when the project sets none
    pub cache_dir: Option<PathBuf>,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let (project, project_root) = Self::load_project()?;

        Ok(Self {
            project,
            global,
            project_root,
        })
    }

    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(project_root)?;

        Ok(Self {
            project,
            global,
            project_root: Some(project_root.to_path_buf()),
        })
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("dev", "mavengen", "mavengen")
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns the per-user cache directory
    pub fn default_cache_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.cache_dir().to_path_buf())
    }

    /// Loads global configuration
    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Finds and loads project configuration
    fn load_project() -> Result<(ProjectConfig, Option<PathBuf>)> {
        match Self::find_project_root() {
            Some(root) => {
                let config = Self::load_project_config(&root)?;
                Ok((config, Some(root)))
            }
            None => Ok((ProjectConfig::default(), None)),
        }
    }

    /// Loads and validates project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(PROJECT_DIR).join("config.toml");

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse project config")?;

        config
            .validate()
            .with_context(|| format!("Invalid project config: {}", config_path.display()))?;
        Ok(config)
    }

    /// Finds the project root by looking for `.mavengen/` from the current directory
    pub fn find_project_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::find_project_root_from(&current)
    }

    /// Finds the project root by walking up from `start`
    pub fn find_project_root_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Returns true if we're in a mavengen project
    pub fn is_in_project(&self) -> bool {
        self.project_root.is_some()
    }

    /// Returns the project root, or an error if not in a project
    pub fn require_project_root(&self) -> Result<&Path> {
        self.project_root
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Not in a mavengen project. Run 'mavengen init' first."))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.project_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Output repository root (`<project>/repo` unless configured)
    pub fn output_dir(&self) -> Result<PathBuf> {
        let root = self.require_project_root()?;
        Ok(match &self.project.output {
            Some(path) => self.resolve(path),
            None => root.join("repo"),
        })
    }

    /// Cache root: explicit override, then project, then global, then the user cache dir
    pub fn cache_dir(&self, override_dir: Option<&Path>) -> Option<PathBuf> {
        override_dir
            .map(Path::to_path_buf)
            .or_else(|| self.project.cache_dir.as_deref().map(|p| self.resolve(p)))
            .or_else(|| self.global.cache_dir.clone())
            .or_else(Self::default_cache_dir)
    }

    /// Looks up a `[modules.<name>]` table
    pub fn module(&self, name: &str) -> Option<&ModuleConfig> {
        self.project.modules.get(name)
    }

    /// Saves the project configuration
    pub fn save_project(&self) -> Result<()> {
        let root = self.require_project_root()?;
        let config_path = root.join(PROJECT_DIR).join("config.toml");

        let content =
            toml::to_string_pretty(&self.project).context("Failed to serialize project config")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write project config: {}", config_path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MarkerMatch;
    use tempfile::TempDir;

    fn in_project(root: &Path, project: ProjectConfig) -> Config {
        Config {
            project,
            global: GlobalConfig::default(),
            project_root: Some(root.to_path_buf()),
        }
    }

    #[test]
    fn default_config() {
        let config = ProjectConfig::default();
        assert_eq!(config.checksums, vec![ChecksumAlgorithm::Sha256]);
        assert!(config.modules.is_empty());
        assert_eq!(config.version_policy, VersionPolicy::default());
    }

    #[test]
    fn parse_project_config() {
        let toml = r#"
output = "maven"
checksums = ["sha256", "blake3"]

[version_policy]
forbidden_markers = ["nightly"]
marker_match = "segment"

[modules.mcp]
kind = "mappings"
group = "de.oceanlabs.mcp"
artifact = "mcp_stable"
minecraft = "1.12.2"
source = "inputs/mcp-{timestamp}.zip"

[modules.tools]
kind = "bundle"
group = "org.example"
description = "Toolchain jars"

[[modules.tools.files]]
source = "build/tools.jar"

[[modules.tools.files]]
source = "build/tools-sources.jar"
classifier = "sources"
"#;

        let config: ProjectConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.output, Some(PathBuf::from("maven")));
        assert_eq!(
            config.checksums,
            vec![ChecksumAlgorithm::Sha256, ChecksumAlgorithm::Blake3]
        );
        assert_eq!(config.version_policy.marker_match, MarkerMatch::Segment);

        let mcp = &config.modules["mcp"];
        assert_eq!(mcp.kind, ModuleKind::Mappings);
        assert_eq!(mcp.artifact_name("mcp"), "mcp_stable");

        let tools = &config.modules["tools"];
        assert_eq!(tools.artifact_name("tools"), "tools");
        assert_eq!(tools.files.len(), 2);
        assert_eq!(tools.files[0].extension, "jar");
        assert_eq!(tools.files[1].classifier.as_deref(), Some("sources"));
    }

    #[test]
    fn rejects_incomplete_modules() {
        let toml = r#"
[modules.broken]
kind = "mappings"
group = "org.example"
"#;
        let config: ProjectConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().unwrap_err().to_string().contains("needs a source"));

        let toml = r#"
[modules.empty]
kind = "bundle"
group = "org.example"
"#;
        let config: ProjectConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unstable_default_platform() {
        let toml = r#"
[modules.maps]
kind = "mappings"
group = "org.example"
minecraft = "1.12-nightly-SNAPSHOT"
source = "maps.zip"
"#;
        let config: ProjectConfig = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("module 'maps'"), "{err}");
        assert!(err.contains("nightly"), "{err}");
    }

    #[test]
    fn rejects_unknown_kind() {
        let toml = r#"
[modules.x]
kind = "plugin"
group = "org.example"
"#;
        assert!(toml::from_str::<ProjectConfig>(toml).is_err());
    }

    #[test]
    fn find_project_root_from_subdirectory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(PROJECT_DIR)).unwrap();

        let sub_dir = dir.path().join("sub").join("dir");
        fs::create_dir_all(&sub_dir).unwrap();

        let root = Config::find_project_root_from(&sub_dir);
        assert_eq!(root.as_deref(), Some(dir.path()));
    }

    #[test]
    fn config_not_in_project() {
        let config = Config {
            project: ProjectConfig::default(),
            global: GlobalConfig::default(),
            project_root: None,
        };

        assert!(!config.is_in_project());
        assert!(config.require_project_root().is_err());
        assert!(config.output_dir().is_err());
    }

    #[test]
    fn paths_resolve_against_project_root() {
        let dir = TempDir::new().unwrap();
        let mut project = ProjectConfig::default();
        let config = in_project(dir.path(), project.clone());
        assert_eq!(config.output_dir().unwrap(), dir.path().join("repo"));

        project.output = Some(PathBuf::from("maven"));
        project.cache_dir = Some(PathBuf::from(".cache"));
        let config = in_project(dir.path(), project);

        assert_eq!(config.output_dir().unwrap(), dir.path().join("maven"));
        assert_eq!(config.cache_dir(None), Some(dir.path().join(".cache")));
        assert_eq!(
            config.cache_dir(Some(Path::new("/tmp/override"))),
            Some(PathBuf::from("/tmp/override"))
        );
    }

    #[test]
    fn global_cache_dir_used_when_project_sets_none() {
        let dir = TempDir::new().unwrap();
        let mut config = in_project(dir.path(), ProjectConfig::default());
        config.global.cache_dir = Some(PathBuf::from("/var/cache/mavengen"));

        assert_eq!(
            config.cache_dir(None),
            Some(PathBuf::from("/var/cache/mavengen"))
        );
    }

    #[test]
    fn save_and_reload_project() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(PROJECT_DIR)).unwrap();

        let mut project = ProjectConfig::default();
        project.modules.insert(
            "tools".to_string(),
            ModuleConfig {
                kind: ModuleKind::Bundle,
                group: "org.example".to_string(),
                artifact: None,
                minecraft: None,
                source: None,
                classifier: None,
                extension: None,
                files: vec![BundleFile {
                    source: "tools.jar".to_string(),
                    classifier: None,
                    extension: "jar".to_string(),
                }],
                description: None,
            },
        );
        in_project(dir.path(), project).save_project().unwrap();

        let reloaded = Config::for_project(dir.path()).unwrap();
        assert_eq!(reloaded.module("tools").unwrap().kind, ModuleKind::Bundle);
    }
}
