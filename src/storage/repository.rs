//! Output repository in Maven layout
//!
//! ```text
//! <output>/
//! └── org/example/mappings/
//!     ├── maven-metadata.xml
//!     ├── maven-metadata.xml.sha256
//!     └── 2026.01.01-1.12/
//!         ├── mappings-2026.01.01-1.12.zip
//!         ├── mappings-2026.01.01-1.12.zip.sha256
//!         └── mappings-2026.01.01-1.12.pom
//! ```
//!
//! Files are written to a temp file and renamed into place, so a partially
//! written artifact never appears at its canonical path. Sidecars are
//! recomputed and overwritten on every publish.

use std::cmp::Ordering;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use crate::domain::{ArtifactIdentity, ChecksumAlgorithm};

/// One sidecar digest of a published file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checksum {
    pub algorithm: ChecksumAlgorithm,
    pub digest: String,
}

/// A file written into the repository together with its sidecars
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedFile {
    pub path: PathBuf,
    pub checksums: Vec<Checksum>,
}

/// Local directory laid out like a Maven repository
#[derive(Debug, Clone)]
pub struct OutputRepository {
    root: PathBuf,
    checksums: Vec<ChecksumAlgorithm>,
}

impl OutputRepository {
    pub fn new(root: impl Into<PathBuf>, checksums: Vec<ChecksumAlgorithm>) -> Self {
        Self {
            root: root.into(),
            checksums,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn checksums(&self) -> &[ChecksumAlgorithm] {
        &self.checksums
    }

    /// Absolute location of an artifact inside the repository
    pub fn path_of(&self, artifact: &ArtifactIdentity) -> PathBuf {
        self.root.join(artifact.relative_path())
    }

    /// Copies `source` to the artifact's canonical path and refreshes its sidecars
    pub fn publish(&self, source: &Path, artifact: &ArtifactIdentity) -> io::Result<PublishedFile> {
        let dest = self.path_of(artifact);
        copy_atomic(source, &dest)?;
        let checksums = self.write_checksums(&dest)?;
        Ok(PublishedFile {
            path: dest,
            checksums,
        })
    }

    /// Recomputes and overwrites every configured sidecar for `file`
    pub fn write_checksums(&self, file: &Path) -> io::Result<Vec<Checksum>> {
        let mut written = Vec::with_capacity(self.checksums.len());
        for algorithm in &self.checksums {
            let digest = algorithm.hash_file(file)?;
            write_atomic(&algorithm.sidecar_path(file), digest.as_bytes())?;
            written.push(Checksum {
                algorithm: *algorithm,
                digest,
            });
        }
        Ok(written)
    }

    /// True when the artifact exists and every sidecar matches its content
    pub fn verify(&self, artifact: &ArtifactIdentity) -> io::Result<bool> {
        let file = self.path_of(artifact);
        if !file.is_file() {
            return Ok(false);
        }
        for algorithm in &self.checksums {
            let sidecar = algorithm.sidecar_path(&file);
            let recorded = match fs::read_to_string(&sidecar) {
                Ok(s) => s,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
                Err(e) => return Err(e),
            };
            if recorded.trim() != algorithm.hash_file(&file)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Version directories present for the artifact, in Maven order
    pub fn versions(&self, artifact: &ArtifactIdentity) -> io::Result<Vec<String>> {
        let base = self.root.join(artifact.base_dir());
        if !base.is_dir() {
            return Ok(Vec::new());
        }

        let mut versions = Vec::new();
        for entry in fs::read_dir(&base)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let has_files = fs::read_dir(entry.path())?
                .filter_map(Result::ok)
                .any(|e| e.path().is_file());
            if has_files {
                versions.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        versions.sort_by(|a, b| compare_versions(a, b));
        Ok(versions)
    }

    /// Rewrites `maven-metadata.xml` for the artifact from the versions on disk
    pub fn update_metadata(&self, artifact: &ArtifactIdentity) -> io::Result<PublishedFile> {
        let versions = self.versions(artifact)?;
        let xml = render_metadata(artifact.group(), artifact.name(), &versions);

        let path = self.root.join(artifact.metadata_path());
        write_atomic(&path, xml.as_bytes())?;
        let checksums = self.write_checksums(&path)?;
        Ok(PublishedFile { path, checksums })
    }
}

fn render_metadata(group: &str, name: &str, versions: &[String]) -> String {
    let latest = versions.last();
    let release = versions.iter().rev().find(|v| !v.ends_with("-SNAPSHOT"));

    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<metadata>\n");
    xml.push_str(&format!("  <groupId>{}</groupId>\n", xml_escape(group)));
    xml.push_str(&format!("  <artifactId>{}</artifactId>\n", xml_escape(name)));
    xml.push_str("  <versioning>\n");
    if let Some(latest) = latest {
        xml.push_str(&format!("    <latest>{}</latest>\n", xml_escape(latest)));
    }
    if let Some(release) = release {
        xml.push_str(&format!("    <release>{}</release>\n", xml_escape(release)));
    }
    xml.push_str("    <versions>\n");
    for version in versions {
        xml.push_str(&format!("      <version>{}</version>\n", xml_escape(version)));
    }
    xml.push_str("    </versions>\n");
    xml.push_str(&format!(
        "    <lastUpdated>{}</lastUpdated>\n",
        Utc::now().format("%Y%m%d%H%M%S")
    ));
    xml.push_str("  </versioning>\n</metadata>\n");
    xml
}

pub(crate) fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[derive(Debug, PartialEq, Eq)]
enum VersionToken<'a> {
    Number(u64),
    Qualifier(&'a str),
}

fn tokenize(version: &str) -> Vec<VersionToken<'_>> {
    let mut tokens = Vec::new();
    for part in version.split(['.', '-']) {
        let mut start = 0;
        let bytes = part.as_bytes();
        for i in 1..=bytes.len() {
            let boundary = i == bytes.len()
                || bytes[i].is_ascii_digit() != bytes[i - 1].is_ascii_digit();
            if boundary {
                let token = &part[start..i];
                tokens.push(match token.parse::<u64>() {
                    Ok(n) => VersionToken::Number(n),
                    Err(_) => VersionToken::Qualifier(token),
                });
                start = i;
            }
        }
    }
    tokens
}

/// Maven-style ordering: numeric parts compare numerically, a trailing
/// qualifier (`pre1`, `rc2`, `SNAPSHOT`) sorts before the bare release
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (ta, tb) = (tokenize(a), tokenize(b));
    for pair in ta.iter().zip(tb.iter()) {
        let ord = match pair {
            (VersionToken::Number(x), VersionToken::Number(y)) => x.cmp(y),
            (VersionToken::Number(_), VersionToken::Qualifier(_)) => Ordering::Greater,
            (VersionToken::Qualifier(_), VersionToken::Number(_)) => Ordering::Less,
            (VersionToken::Qualifier(x), VersionToken::Qualifier(y)) => {
                x.to_ascii_lowercase().cmp(&y.to_ascii_lowercase())
            }
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    match ta.len().cmp(&tb.len()) {
        Ordering::Greater => tail(&ta, tb.len()),
        Ordering::Less => tail(&tb, ta.len()).reverse(),
        Ordering::Equal => a.cmp(b),
    }
}

/// Ordering of the longer version against its prefix
fn tail(longer: &[VersionToken<'_>], shorter_len: usize) -> Ordering {
    match longer.get(shorter_len) {
        Some(VersionToken::Qualifier(_)) => Ordering::Less,
        Some(VersionToken::Number(_)) => Ordering::Greater,
        None => Ordering::Equal,
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = std::ffi::OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".part");
    path.with_file_name(name)
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent),
        None => Ok(()),
    }
}

/// Copies via a temp sibling and renames into place
pub(crate) fn copy_atomic(source: &Path, dest: &Path) -> io::Result<()> {
    ensure_parent(dest)?;
    let temp = temp_sibling(dest);
    if let Err(e) = fs::copy(source, &temp) {
        let _ = fs::remove_file(&temp);
        return Err(e);
    }
    fs::rename(&temp, dest)
}

/// Writes via a temp sibling and renames into place
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    ensure_parent(path)?;
    let temp = temp_sibling(path);
    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp)?;
        file.write_all(contents)?;
        file.flush()?;
    }
    fs::rename(&temp, path)
}
