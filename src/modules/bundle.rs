//! Bundle planner
//!
//! Publishes every `[[modules.<name>.files]]` entry under an opaque version,
//! plus a POM. Entries that resolve to the same input share one task, so the
//! input is read and cached once.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;

use crate::domain::ArtifactIdentity;
use crate::pipeline::{
    ArtifactPlanner, OutputArtifact, PendingArtifact, PipelineError, PlanRequest, Repo, Task,
};
use crate::storage::{CacheKey, ModuleKind};

use super::{fingerprint, render_pom, resolve_input, TemplateVars};

#[derive(Debug, Default, Clone, Copy)]
pub struct BundlePlanner;

impl ArtifactPlanner for BundlePlanner {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Bundle
    }

    fn process(
        &self,
        repo: &Repo,
        request: &PlanRequest<'_>,
    ) -> Result<Vec<OutputArtifact>, PipelineError> {
        let module = request.module;
        let version = request.version;
        let config = request.config;

        if config.files.is_empty() {
            return Err(PipelineError::invalid_module(module, "no files configured"));
        }

        let vars = TemplateVars::new(module, version);
        let base = ArtifactIdentity::new(
            config.group.as_str(),
            config.artifact_name(module),
            version,
            None,
            "jar",
        )?;

        let mut tasks: HashMap<PathBuf, Rc<Task>> = HashMap::new();
        let mut pending: Vec<PendingArtifact> = Vec::with_capacity(config.files.len() + 1);

        for file in &config.files {
            let artifact = base
                .with_classifier(file.classifier.as_deref())?
                .with_extension(&file.extension)?;
            if pending.iter().any(|p| p.artifact() == &artifact) {
                return Err(PipelineError::invalid_module(
                    module,
                    format!("{} is listed twice", artifact),
                ));
            }

            let rendered = vars
                .render(&file.source)
                .map_err(|reason| PipelineError::invalid_module(module, reason))?;
            let input = resolve_input(request.base_dir, &rendered);

            let task = tasks
                .entry(input.clone())
                .or_insert_with(|| Rc::new(copy_task(module, version, input)))
                .clone();

            let message = format!("Packaging {}", artifact.file_name());
            pending.push(repo.pending(message, task, artifact));
        }

        let main_extension = config
            .files
            .iter()
            .find(|f| f.classifier.is_none())
            .map_or("jar", |f| f.extension.as_str());
        let pom = base.with_extension("pom")?;
        let pom_xml = render_pom(&pom, main_extension, config.description.as_deref());
        let pom_name = pom.file_name();
        let pom_task = Rc::new(Task::uncached(format!("{}:pom", module), move |cx| {
            Ok(cx.write_scratch(&pom_name, pom_xml.as_bytes())?)
        }));
        pending.push(repo.pending(format!("Writing POM for {}", module), pom_task, pom));

        let outputs = repo.output(&pending)?;
        repo.update_metadata(&base)?;

        Ok(outputs)
    }
}

fn copy_task(module: &str, version: &str, input: PathBuf) -> Task {
    let key = CacheKey::new([
        "bundle",
        module,
        version,
        input.to_string_lossy().as_ref(),
        fingerprint(&input).as_str(),
    ]);
    let name = match input.file_name() {
        Some(file) => format!("{}:{}", module, file.to_string_lossy()),
        None => module.to_string(),
    };

    Task::new(name, key, move |cx| {
        let file_name = input
            .file_name()
            .with_context(|| format!("Input has no file name: {}", input.display()))?;
        let dest = cx.scratch_path(&file_name.to_string_lossy())?;
        fs::copy(&input, &dest)
            .with_context(|| format!("Failed to read input: {}", input.display()))?;
        Ok(dest)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChecksumAlgorithm, VersionPolicy};
    use crate::storage::{BundleFile, Cache, ModuleConfig, OutputRepository};
    use tempfile::TempDir;

    fn file(source: &str, classifier: Option<&str>, extension: &str) -> BundleFile {
        BundleFile {
            source: source.to_string(),
            classifier: classifier.map(str::to_string),
            extension: extension.to_string(),
        }
    }

    fn module(files: Vec<BundleFile>) -> ModuleConfig {
        ModuleConfig {
            kind: ModuleKind::Bundle,
            group: "net.example.tools".to_string(),
            artifact: Some("toolchain".to_string()),
            minecraft: None,
            source: None,
            classifier: None,
            extension: None,
            files,
            description: None,
        }
    }

    fn run(
        dir: &TempDir,
        config: &ModuleConfig,
        version: &str,
    ) -> Result<Vec<OutputArtifact>, PipelineError> {
        let cache = Cache::open(&dir.path().join("cache")).unwrap();
        run_with(dir, config, version, Some(cache))
    }

    fn run_with(
        dir: &TempDir,
        config: &ModuleConfig,
        version: &str,
        cache: Option<Cache>,
    ) -> Result<Vec<OutputArtifact>, PipelineError> {
        let repository =
            OutputRepository::new(dir.path().join("out"), vec![ChecksumAlgorithm::Sha512]);
        let repo = Repo::new(repository, cache).unwrap();
        let policy = VersionPolicy::default();
        BundlePlanner.process(
            &repo,
            &PlanRequest {
                module: "tools",
                version,
                config,
                policy: &policy,
                base_dir: dir.path(),
            },
        )
    }

    #[test]
    fn publishes_each_file_then_pom() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("tools-2.0.jar"), "classes").unwrap();
        fs::write(dir.path().join("sources.jar"), "sources").unwrap();

        let config = module(vec![
            file("tools-{version}.jar", None, "jar"),
            file("sources.jar", Some("sources"), "jar"),
        ]);
        let outputs = run(&dir, &config, "2.0").unwrap();

        let names: Vec<String> = outputs.iter().map(|o| o.artifact.file_name()).collect();
        assert_eq!(
            names,
            vec![
                "toolchain-2.0.jar",
                "toolchain-2.0-sources.jar",
                "toolchain-2.0.pom"
            ]
        );
        assert_eq!(fs::read_to_string(&outputs[1].file).unwrap(), "sources");
        assert!(outputs[0]
            .file
            .ends_with("net/example/tools/toolchain/2.0/toolchain-2.0.jar"));
        assert!(dir
            .path()
            .join("out/net/example/tools/toolchain/maven-metadata.xml")
            .is_file());
    }

    #[test]
    fn shared_input_is_cached_once() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("all.jar"), "fat").unwrap();

        let config = module(vec![
            file("all.jar", None, "jar"),
            file("all.jar", Some("all"), "jar"),
        ]);
        let outputs = run(&dir, &config, "1.0").unwrap();
        assert_eq!(outputs[0].checksums, outputs[1].checksums);

        let cache = Cache::open(&dir.path().join("cache")).unwrap();
        assert_eq!(cache.stats().unwrap().entries, 1);
    }

    #[test]
    fn same_file_name_in_different_folders_without_cache() {
        let dir = TempDir::new().unwrap();
        for (folder, contents) in [("a", "AAA"), ("b", "BBB")] {
            fs::create_dir_all(dir.path().join(folder)).unwrap();
            fs::write(dir.path().join(folder).join("tool.jar"), contents).unwrap();
        }

        let config = module(vec![
            file("a/tool.jar", None, "jar"),
            file("b/tool.jar", Some("b"), "jar"),
            file("a/tool.jar", Some("a2"), "jar"),
        ]);
        let outputs = run_with(&dir, &config, "1.0", None).unwrap();

        let contents: Vec<String> = outputs[..3]
            .iter()
            .map(|o| fs::read_to_string(&o.file).unwrap())
            .collect();
        assert_eq!(contents, vec!["AAA", "BBB", "AAA"]);
        assert_eq!(outputs[0].checksums, outputs[2].checksums);
    }

    #[test]
    fn duplicate_artifacts_are_rejected() {
        let dir = TempDir::new().unwrap();
        let config = module(vec![file("a.jar", None, "jar"), file("b.jar", None, "jar")]);

        let err = run(&dir, &config, "1.0").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidModule { .. }));
    }

    #[test]
    fn missing_input_stops_batch() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("present.jar"), "here").unwrap();

        let config = module(vec![
            file("present.jar", None, "jar"),
            file("missing.jar", Some("extra"), "jar"),
        ]);
        let err = run(&dir, &config, "1.0").unwrap_err();

        assert_eq!(err.artifact().unwrap().classifier(), Some("extra"));
        assert!(dir
            .path()
            .join("out/net/example/tools/toolchain/1.0/toolchain-1.0.jar")
            .is_file());
        assert!(!dir
            .path()
            .join("out/net/example/tools/toolchain/1.0/toolchain-1.0.pom")
            .exists());
    }
}
