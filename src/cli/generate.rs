//! `generate` and `modules` commands

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::output::Output;
use crate::modules;
use crate::pipeline::{Driver, Repo};
use crate::storage::Project;

/// Driver over the project's modules with every built-in planner registered
pub(super) fn driver_for(project: &Project) -> Driver {
    let config = &project.config().project;
    let mut driver = Driver::new(
        config.modules.clone(),
        config.version_policy.clone(),
        project.root(),
    );
    modules::register_builtin(&mut driver);
    driver
}

pub fn run(
    output: &Output,
    module: &str,
    version: &str,
    cache_dir: Option<&Path>,
    no_cache: bool,
) -> Result<()> {
    let project = Project::open_current()?;
    let cache = if no_cache {
        info!("cache disabled");
        None
    } else {
        Some(project.open_cache(cache_dir)?)
    };

    let repository = project.output_repository()?;
    let root = repository.root().to_path_buf();
    let repo = Repo::new(repository, cache).context("Failed to create scratch directory")?;
    let driver = driver_for(&project);

    let outputs = match driver.process(&repo, module, version) {
        Ok(outputs) => outputs,
        Err(err) => {
            if err.is_retryable() {
                warn!("already published artifacts were kept; rerun once the cause is fixed");
            }
            return Err(err).with_context(|| format!("Failed to generate {} {}", module, version));
        }
    };

    if output.is_json() {
        output.data(&serde_json::json!({
            "module": module,
            "version": version,
            "output": root.display().to_string(),
            "artifacts": outputs,
        }));
    } else {
        for published in &outputs {
            let coordinates = published.artifact.to_string();
            let file = published.file.display().to_string();
            output.row(&[coordinates.as_str(), file.as_str()]);
        }
        output.success(&format!(
            "Published {} artifact(s) to {}",
            outputs.len(),
            root.display()
        ));
    }

    Ok(())
}

pub fn list(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let driver = driver_for(&project);

    if output.is_json() {
        let items: Vec<_> = driver
            .modules()
            .iter()
            .map(|(name, module)| {
                serde_json::json!({
                    "name": name,
                    "kind": module.kind,
                    "group": module.group,
                    "artifact": module.artifact_name(name),
                    "description": module.description,
                })
            })
            .collect();
        output.data(&items);
        return Ok(());
    }

    if driver.modules().is_empty() {
        println!("No modules configured. Add [modules.<name>] tables to .mavengen/config.toml");
        return Ok(());
    }

    println!("{:<20} {:<10} COORDINATES", "MODULE", "KIND");
    println!("{}", "-".repeat(60));
    for (name, module) in driver.modules() {
        println!(
            "{:<20} {:<10} {}:{}",
            name,
            module.kind,
            module.group,
            module.artifact_name(name)
        );
    }
    output.blank();
    println!("{} module(s)", driver.modules().len());

    Ok(())
}
