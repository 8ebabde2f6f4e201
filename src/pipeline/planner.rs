//! Planner dispatch
//!
//! An [`ArtifactPlanner`] turns a `(module, version)` request into the set of
//! artifacts to publish. The [`Driver`] looks up the module's table, picks
//! the planner registered for its [`ModuleKind`] and runs it against a
//! [`Repo`].

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::VersionPolicy;
use crate::storage::{ModuleConfig, ModuleKind};

use super::error::PipelineError;
use super::pending::OutputArtifact;
use super::repo::Repo;

/// One `generate` request as seen by a planner
#[derive(Debug, Clone, Copy)]
pub struct PlanRequest<'a> {
    pub module: &'a str,
    pub version: &'a str,
    pub config: &'a ModuleConfig,
    pub policy: &'a VersionPolicy,

    /// Relative input paths resolve against this directory
    pub base_dir: &'a Path,
}

/// Decides which artifacts a module version consists of and publishes them
pub trait ArtifactPlanner {
    /// Module kind this planner handles
    fn kind(&self) -> ModuleKind;

    fn process(
        &self,
        repo: &Repo,
        request: &PlanRequest<'_>,
    ) -> Result<Vec<OutputArtifact>, PipelineError>;
}

/// Registry of planners plus the configured modules
pub struct Driver {
    planners: HashMap<ModuleKind, Box<dyn ArtifactPlanner>>,
    modules: BTreeMap<String, ModuleConfig>,
    policy: VersionPolicy,
    base_dir: PathBuf,
}

impl Driver {
    pub fn new(
        modules: BTreeMap<String, ModuleConfig>,
        policy: VersionPolicy,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            planners: HashMap::new(),
            modules,
            policy,
            base_dir: base_dir.into(),
        }
    }

    /// Registers a planner, replacing any earlier one for the same kind
    pub fn register(&mut self, planner: Box<dyn ArtifactPlanner>) {
        self.planners.insert(planner.kind(), planner);
    }

    pub fn modules(&self) -> &BTreeMap<String, ModuleConfig> {
        &self.modules
    }

    pub fn has_planner(&self, kind: ModuleKind) -> bool {
        self.planners.contains_key(&kind)
    }

    /// Generates and publishes every artifact of `module` at `version`
    pub fn process(
        &self,
        repo: &Repo,
        module: &str,
        version: &str,
    ) -> Result<Vec<OutputArtifact>, PipelineError> {
        let config = self
            .modules
            .get(module)
            .ok_or_else(|| PipelineError::UnknownModule(module.to_string()))?;
        let planner = self.planners.get(&config.kind).ok_or_else(|| {
            PipelineError::invalid_module(module, format!("no planner for kind '{}'", config.kind))
        })?;

        info!(module, version, kind = %config.kind, "processing");
        let request = PlanRequest {
            module,
            version,
            config,
            policy: &self.policy,
            base_dir: &self.base_dir,
        };
        planner.process(repo, &request)
    }
}
