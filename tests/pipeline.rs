//! Library-level tests for the artifact pipeline
//!
//! A custom planner is registered next to the built-ins to check the
//! contract every planner relies on: ordered publication, shared tasks,
//! and partial output surviving a failure.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fs;
use std::rc::Rc;

use tempfile::TempDir;

use mavengen::modules::register_builtin;
use mavengen::pipeline::{ArtifactPlanner, OutputArtifact, PlanRequest, Task};
use mavengen::storage::{Cache, CacheKey, ModuleConfig, ModuleKind, OutputRepository};
use mavengen::{
    ArtifactIdentity, ChecksumAlgorithm, Driver, PipelineError, Repo, VersionPolicy,
};

fn module(kind: ModuleKind) -> ModuleConfig {
    ModuleConfig {
        kind,
        group: "org.example".to_string(),
        artifact: None,
        minecraft: None,
        source: Some("inputs/{module}-{version}.zip".to_string()),
        classifier: None,
        extension: None,
        files: Vec::new(),
        description: None,
    }
}

fn repo(dir: &TempDir) -> Repo {
    let repository = OutputRepository::new(
        dir.path().join("out"),
        vec![ChecksumAlgorithm::Sha256, ChecksumAlgorithm::Blake3],
    );
    let cache = Cache::open(&dir.path().join("cache")).unwrap();
    Repo::new(repository, Some(cache)).unwrap()
}

/// Publishes `main`, `extra` and `broken` in that order; `broken` fails on
/// its first run only. `main` and `extra` share one task.
struct Flaky {
    runs: Rc<Cell<usize>>,
    broken_attempts: Rc<Cell<usize>>,
}

impl ArtifactPlanner for Flaky {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Bundle
    }

    fn process(
        &self,
        repo: &Repo,
        request: &PlanRequest<'_>,
    ) -> Result<Vec<OutputArtifact>, PipelineError> {
        let base = ArtifactIdentity::new(
            request.config.group.as_str(),
            request.module,
            request.version,
            None,
            "jar",
        )?;

        let runs = Rc::clone(&self.runs);
        let shared = Rc::new(Task::new(
            "shared",
            CacheKey::new(["flaky", request.module, request.version]),
            move |cx| {
                runs.set(runs.get() + 1);
                Ok(cx.write_scratch("shared.jar", b"shared")?)
            },
        ));

        let attempts = Rc::clone(&self.broken_attempts);
        let broken = Rc::new(Task::uncached("broken", move |cx| {
            attempts.set(attempts.get() + 1);
            if attempts.get() == 1 {
                anyhow::bail!("transient failure");
            }
            Ok(cx.write_scratch("broken.jar", b"fixed")?)
        }));

        repo.output(&[
            repo.pending("main", Rc::clone(&shared), base.clone()),
            repo.pending("extra", shared, base.with_classifier(Some("extra"))?),
            repo.pending("broken", broken, base.with_classifier(Some("broken"))?),
        ])
    }
}

#[test]
fn failed_batch_keeps_earlier_artifacts_and_retries() {
    let dir = TempDir::new().unwrap();
    let repo = repo(&dir);

    let runs = Rc::new(Cell::new(0));
    let broken_attempts = Rc::new(Cell::new(0));
    let mut modules = BTreeMap::new();
    modules.insert("flaky".to_string(), module(ModuleKind::Bundle));
    let mut driver = Driver::new(modules, VersionPolicy::default(), dir.path());
    driver.register(Box::new(Flaky {
        runs: Rc::clone(&runs),
        broken_attempts: Rc::clone(&broken_attempts),
    }));

    let err = driver.process(&repo, "flaky", "1.0").unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(err.artifact().unwrap().classifier(), Some("broken"));

    let main = ArtifactIdentity::new("org.example", "flaky", "1.0", None, "jar").unwrap();
    assert!(repo.repository().verify(&main).unwrap());
    assert!(repo
        .repository()
        .verify(&main.with_classifier(Some("extra")).unwrap())
        .unwrap());
    assert_eq!(runs.get(), 1);

    let outputs = driver.process(&repo, "flaky", "1.0").unwrap();
    assert_eq!(outputs.len(), 3);
    assert_eq!(fs::read_to_string(&outputs[2].file).unwrap(), "fixed");
    // the shared task came from the cache on the retry
    assert_eq!(runs.get(), 1);
    assert_eq!(repo.log().depth(), 0);
}

#[test]
fn builtin_mappings_through_driver() {
    let dir = TempDir::new().unwrap();
    let repo = repo(&dir);
    fs::create_dir_all(dir.path().join("inputs")).unwrap();
    fs::write(
        dir.path().join("inputs/maps-2026.03.04-1.12.zip"),
        b"PK\x05\x06",
    )
    .unwrap();

    let mut modules = BTreeMap::new();
    modules.insert("maps".to_string(), module(ModuleKind::Mappings));
    let mut driver = Driver::new(modules, VersionPolicy::default(), dir.path());
    register_builtin(&mut driver);

    let outputs = driver.process(&repo, "maps", "1.12-2026.03.04-1.12").unwrap();

    assert_eq!(outputs[0].artifact.version(), "2026.03.04-1.12");
    for output in &outputs {
        for checksum in &output.checksums {
            let sidecar = checksum.algorithm.sidecar_path(&output.file);
            assert_eq!(fs::read_to_string(sidecar).unwrap(), checksum.digest);
        }
    }
}
