//! Mapping archive planner
//!
//! Publishes the mapping archive named by the module's `source` template and
//! a POM, both under the canonical friendly version. A version that names no
//! target platform is retargeted to the module's configured `minecraft`.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::rc::Rc;

use anyhow::{bail, Context};

use crate::domain::{ArtifactIdentity, VersionTriple};
use crate::pipeline::{ArtifactPlanner, OutputArtifact, PipelineError, PlanRequest, Repo, Task};
use crate::storage::{CacheKey, ModuleKind};

use super::{fingerprint, render_pom, resolve_input, TemplateVars};

const DEFAULT_EXTENSION: &str = "zip";

/// Local file header or empty-archive end record
const ZIP_MAGIC: [&[u8; 4]; 2] = [b"PK\x03\x04", b"PK\x05\x06"];

#[derive(Debug, Default, Clone, Copy)]
pub struct MappingsPlanner;

impl MappingsPlanner {
    /// Decodes the requested version and applies the module's default platform
    pub fn resolve_version(request: &PlanRequest<'_>) -> Result<VersionTriple, PipelineError> {
        let parsed = VersionTriple::parse_with(request.version, request.policy)?;
        match (parsed.mc_version(), request.config.minecraft.as_deref()) {
            (None, Some(minecraft)) => Ok(parsed.with_minecraft_in(minecraft, request.policy)?),
            _ => Ok(parsed),
        }
    }
}

impl ArtifactPlanner for MappingsPlanner {
    fn kind(&self) -> ModuleKind {
        ModuleKind::Mappings
    }

    fn process(
        &self,
        repo: &Repo,
        request: &PlanRequest<'_>,
    ) -> Result<Vec<OutputArtifact>, PipelineError> {
        let module = request.module;
        let config = request.config;

        let triple = Self::resolve_version(request)?;
        let version = triple.to_friendly();
        let extension = config.extension.as_deref().unwrap_or(DEFAULT_EXTENSION);

        let archive = ArtifactIdentity::new(
            config.group.as_str(),
            config.artifact_name(module),
            version.as_str(),
            config.classifier.clone(),
            extension,
        )?;
        let pom = archive.with_classifier(None)?.with_extension("pom")?;

        let source = config
            .source
            .as_deref()
            .ok_or_else(|| PipelineError::invalid_module(module, "no source configured"))?;
        let rendered = TemplateVars::new(module, &version)
            .with("timestamp", Some(triple.timestamp()))
            .with("mc", triple.mc_version())
            .with("map_mc", triple.effective_map_mc())
            .render(source)
            .map_err(|reason| PipelineError::invalid_module(module, reason))?;
        let input = resolve_input(request.base_dir, &rendered);

        let key = CacheKey::new([
            "mappings",
            module,
            version.as_str(),
            extension,
            input.to_string_lossy().as_ref(),
            fingerprint(&input).as_str(),
        ]);

        let check_zip = extension == DEFAULT_EXTENSION;
        let file_name = archive.file_name();
        let archive_task = Rc::new(Task::new(
            format!("{}:archive", module),
            key,
            move |cx| {
                if check_zip {
                    ensure_zip(&input)?;
                }
                let dest = cx.scratch_path(&file_name)?;
                fs::copy(&input, &dest)
                    .with_context(|| format!("Failed to read mappings: {}", input.display()))?;
                Ok(dest)
            },
        ));

        let pom_xml = render_pom(&pom, extension, config.description.as_deref());
        let pom_name = pom.file_name();
        let pom_task = Rc::new(Task::uncached(format!("{}:pom", module), move |cx| {
            Ok(cx.write_scratch(&pom_name, pom_xml.as_bytes())?)
        }));

        let outputs = repo.output(&[
            repo.pending(
                format!("Extracting {} {}", module, version),
                archive_task,
                archive.clone(),
            ),
            repo.pending(format!("Writing POM for {}", module), pom_task, pom),
        ])?;
        repo.update_metadata(&archive)?;

        Ok(outputs)
    }
}

fn ensure_zip(path: &Path) -> anyhow::Result<()> {
    let mut magic = [0u8; 4];
    File::open(path)
        .and_then(|mut f| f.read_exact(&mut magic))
        .with_context(|| format!("Failed to read mappings: {}", path.display()))?;

    if !ZIP_MAGIC.iter().any(|m| **m == magic) {
        bail!("{} is not a zip archive", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChecksumAlgorithm, VersionPolicy};
    use crate::storage::{Cache, ModuleConfig, OutputRepository};
    use tempfile::TempDir;

    const ARCHIVE: &[u8] = b"PK\x03\x04mappings";

    fn module(minecraft: Option<&str>) -> ModuleConfig {
        ModuleConfig {
            kind: ModuleKind::Mappings,
            group: "org.example".to_string(),
            artifact: None,
            minecraft: minecraft.map(str::to_string),
            source: Some("inputs/mappings-{timestamp}.zip".to_string()),
            classifier: None,
            extension: None,
            files: Vec::new(),
            description: Some("Test mappings".to_string()),
        }
    }

    fn repo(dir: &TempDir) -> Repo {
        let repository =
            OutputRepository::new(dir.path().join("out"), vec![ChecksumAlgorithm::Sha256]);
        let cache = Cache::open(&dir.path().join("cache")).unwrap();
        Repo::new(repository, Some(cache)).unwrap()
    }

    fn write_input(dir: &TempDir, timestamp: &str, contents: &[u8]) {
        let inputs = dir.path().join("inputs");
        fs::create_dir_all(&inputs).unwrap();
        fs::write(inputs.join(format!("mappings-{}.zip", timestamp)), contents).unwrap();
    }

    fn request<'a>(
        dir: &'a TempDir,
        version: &'a str,
        config: &'a ModuleConfig,
        policy: &'a VersionPolicy,
    ) -> PlanRequest<'a> {
        PlanRequest {
            module: "mappings",
            version,
            config,
            policy,
            base_dir: dir.path(),
        }
    }

    #[test]
    fn bare_timestamp_takes_configured_platform() {
        let dir = TempDir::new().unwrap();
        let config = module(Some("1.12.2"));
        let policy = VersionPolicy::default();

        let request = request(&dir, "2026.01.01", &config, &policy);
        let triple = MappingsPlanner::resolve_version(&request).unwrap();
        assert_eq!(triple.to_friendly(), "2026.01.01-1.12.2");
        assert_eq!(triple.map_mc_version(), Some("1.12.2"));
    }

    #[test]
    fn configured_platform_must_pass_policy() {
        let dir = TempDir::new().unwrap();
        let config = module(Some("1.12-nightly-SNAPSHOT"));
        let policy = VersionPolicy::default();

        let request = request(&dir, "2026.01.01", &config, &policy);
        let err = MappingsPlanner::resolve_version(&request).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidVersion(_)));
    }

    #[test]
    fn explicit_platform_wins() {
        let dir = TempDir::new().unwrap();
        let config = module(Some("1.12.2"));
        let policy = VersionPolicy::default();

        let triple =
            MappingsPlanner::resolve_version(&request(&dir, "2026.01.01-1.13", &config, &policy))
                .unwrap();
        assert_eq!(triple.to_friendly(), "2026.01.01-1.13");
    }

    #[test]
    fn publishes_archive_pom_and_metadata() {
        let dir = TempDir::new().unwrap();
        write_input(&dir, "2026.01.01", ARCHIVE);
        let config = module(Some("1.12.2"));
        let policy = VersionPolicy::default();
        let repo = repo(&dir);

        let outputs = MappingsPlanner
            .process(&repo, &request(&dir, "2026.01.01", &config, &policy))
            .unwrap();

        assert_eq!(outputs.len(), 2);
        assert_eq!(
            outputs[0].artifact.to_string(),
            "org.example:mappings:2026.01.01-1.12.2@zip"
        );
        assert_eq!(fs::read(&outputs[0].file).unwrap(), ARCHIVE);
        assert_eq!(outputs[1].artifact.extension(), "pom");
        let pom = fs::read_to_string(&outputs[1].file).unwrap();
        assert!(pom.contains("<packaging>zip</packaging>"));

        let metadata = dir
            .path()
            .join("out/org/example/mappings/maven-metadata.xml");
        let xml = fs::read_to_string(metadata).unwrap();
        assert!(xml.contains("<version>2026.01.01-1.12.2</version>"));
    }

    #[test]
    fn second_run_is_served_from_cache() {
        let dir = TempDir::new().unwrap();
        write_input(&dir, "2026.01.01", ARCHIVE);
        let config = module(None);
        let policy = VersionPolicy::default();
        let repo = repo(&dir);

        MappingsPlanner
            .process(&repo, &request(&dir, "2026.01.01-1.12", &config, &policy))
            .unwrap();
        let stats = repo.cache().unwrap().stats().unwrap();
        assert_eq!(stats.entries, 1);

        let outputs = MappingsPlanner
            .process(&repo, &request(&dir, "2026.01.01-1.12", &config, &policy))
            .unwrap();
        assert_eq!(fs::read(&outputs[0].file).unwrap(), ARCHIVE);
        assert_eq!(repo.cache().unwrap().stats().unwrap().entries, 1);
    }

    #[test]
    fn rejects_non_zip_input() {
        let dir = TempDir::new().unwrap();
        write_input(&dir, "2026.01.01", b"not a zip");
        let config = module(None);
        let policy = VersionPolicy::default();
        let repo = repo(&dir);

        let err = MappingsPlanner
            .process(&repo, &request(&dir, "2026.01.01", &config, &policy))
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(err.artifact().unwrap().extension(), "zip");
        assert!(repo.cache().unwrap().stats().unwrap().entries == 0);
    }

    #[test]
    fn malformed_version_is_not_retryable() {
        let dir = TempDir::new().unwrap();
        let config = module(None);
        let policy = VersionPolicy::default();
        let repo = repo(&dir);

        let err = MappingsPlanner
            .process(&repo, &request(&dir, "1.12-nightly", &config, &policy))
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidVersion(_)));
        assert!(!err.is_retryable());
    }
}
