//! Artifact identities and their repository layout
//!
//! Coordinate notation: `group:name:version[:classifier][@extension]`
//! (e.g., `org.example:mappings:2026.01.01-1.12:srg@zip`). The extension
//! defaults to `jar` when omitted.
//!
//! Every identity maps to exactly one repository-relative path:
//! `{group as dirs}/{name}/{version}/{name}-{version}[-{classifier}].{extension}`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ArtifactError {
    #[error("Invalid artifact coordinate: expected 'group:name:version[:classifier][@ext]', got '{0}'")]
    InvalidCoordinate(String),

    #[error("Invalid {field} '{value}': must be non-empty and contain no '/', '\\', ':' or '@'")]
    InvalidComponent { field: &'static str, value: String },
}

const DEFAULT_EXTENSION: &str = "jar";

fn validate(field: &'static str, value: &str) -> Result<(), ArtifactError> {
    let bad = value.is_empty()
        || value
            .chars()
            .any(|c| matches!(c, '/' | '\\' | ':' | '@') || c.is_whitespace());
    if bad || value == "." || value == ".." {
        return Err(ArtifactError::InvalidComponent {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Immutable identifier of a single published file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactIdentity {
    group: String,
    name: String,
    version: String,
    classifier: Option<String>,
    extension: String,
}

impl ArtifactIdentity {
    /// Creates a new identity, validating every component
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        classifier: Option<String>,
        extension: impl Into<String>,
    ) -> Result<Self, ArtifactError> {
        let identity = Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
            classifier: classifier.filter(|c| !c.is_empty()),
            extension: extension.into(),
        };

        validate("group", &identity.group)?;
        if identity.group.split('.').any(str::is_empty) {
            return Err(ArtifactError::InvalidComponent {
                field: "group",
                value: identity.group,
            });
        }
        validate("name", &identity.name)?;
        validate("version", &identity.version)?;
        if let Some(classifier) = &identity.classifier {
            validate("classifier", classifier)?;
        }
        validate("extension", &identity.extension)?;

        Ok(identity)
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Returns a copy with a different classifier (or none)
    pub fn with_classifier(&self, classifier: Option<&str>) -> Result<Self, ArtifactError> {
        Self::new(
            self.group.clone(),
            self.name.clone(),
            self.version.clone(),
            classifier.map(str::to_string),
            self.extension.clone(),
        )
    }

    /// Returns a copy with a different extension
    pub fn with_extension(&self, extension: &str) -> Result<Self, ArtifactError> {
        Self::new(
            self.group.clone(),
            self.name.clone(),
            self.version.clone(),
            self.classifier.clone(),
            extension,
        )
    }

    /// File name inside the version directory, e.g. `mappings-1.0-srg.zip`
    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!(
                "{}-{}-{}.{}",
                self.name, self.version, classifier, self.extension
            ),
            None => format!("{}-{}.{}", self.name, self.version, self.extension),
        }
    }

    /// Directory holding every version of this artifact
    pub fn base_dir(&self) -> PathBuf {
        let mut path: PathBuf = self.group.split('.').collect();
        path.push(&self.name);
        path
    }

    /// Canonical repository-relative path of this artifact
    pub fn relative_path(&self) -> PathBuf {
        let mut path = self.base_dir();
        path.push(&self.version);
        path.push(self.file_name());
        path
    }

    /// Repository-relative path of the `maven-metadata.xml` for this artifact
    pub fn metadata_path(&self) -> PathBuf {
        self.base_dir().join("maven-metadata.xml")
    }
}

impl fmt::Display for ArtifactIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{}", classifier)?;
        }
        if self.extension != DEFAULT_EXTENSION {
            write!(f, "@{}", self.extension)?;
        }
        Ok(())
    }
}

impl FromStr for ArtifactIdentity {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (coords, extension) = match s.split_once('@') {
            Some((coords, ext)) => (coords, ext),
            None => (s, DEFAULT_EXTENSION),
        };

        let parts: Vec<&str> = coords.split(':').collect();
        let (group, name, version, classifier) = match parts.as_slice() {
            [group, name, version] => (*group, *name, *version, None),
            [group, name, version, classifier] => {
                (*group, *name, *version, Some(classifier.to_string()))
            }
            _ => return Err(ArtifactError::InvalidCoordinate(s.to_string())),
        };

        Self::new(group, name, version, classifier, extension)
    }
}

impl TryFrom<String> for ArtifactIdentity {
    type Error = ArtifactError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ArtifactIdentity> for String {
    fn from(id: ArtifactIdentity) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn mappings() -> ArtifactIdentity {
        ArtifactIdentity::new("org.example", "mappings", "2026.01.01", None, "zip").unwrap()
    }

    #[test]
    fn relative_path_without_classifier() {
        assert_eq!(
            mappings().relative_path(),
            Path::new("org/example/mappings/2026.01.01/mappings-2026.01.01.zip")
        );
    }

    #[test]
    fn relative_path_with_classifier() {
        let id = mappings().with_classifier(Some("srg")).unwrap();
        assert_eq!(
            id.relative_path(),
            Path::new("org/example/mappings/2026.01.01/mappings-2026.01.01-srg.zip")
        );
    }

    #[test]
    fn single_segment_group_is_one_directory() {
        let id = ArtifactIdentity::new("forge", "client", "1.0", None, "jar").unwrap();
        assert_eq!(
            id.relative_path(),
            Path::new("forge/client/1.0/client-1.0.jar")
        );
    }

    #[test]
    fn metadata_path_is_next_to_versions() {
        assert_eq!(
            mappings().metadata_path(),
            Path::new("org/example/mappings/maven-metadata.xml")
        );
    }

    #[test]
    fn parses_coordinate_notation() {
        let id: ArtifactIdentity = "org.example:mappings:1.0:srg@zip".parse().unwrap();
        assert_eq!(id.group(), "org.example");
        assert_eq!(id.name(), "mappings");
        assert_eq!(id.version(), "1.0");
        assert_eq!(id.classifier(), Some("srg"));
        assert_eq!(id.extension(), "zip");
    }

    #[test]
    fn extension_defaults_to_jar() {
        let id: ArtifactIdentity = "org.example:client:1.0".parse().unwrap();
        assert_eq!(id.extension(), "jar");
        assert_eq!(id.to_string(), "org.example:client:1.0");
    }

    #[test]
    fn display_roundtrips() {
        let s = "org.example:mappings:1.0:srg@zip";
        let id: ArtifactIdentity = s.parse().unwrap();
        assert_eq!(id.to_string(), s);
    }

    #[test]
    fn rejects_malformed_coordinates() {
        assert!("org.example:mappings".parse::<ArtifactIdentity>().is_err());
        assert!("a:b:c:d:e".parse::<ArtifactIdentity>().is_err());
        assert!("org..example:b:1".parse::<ArtifactIdentity>().is_err());
        assert!("org.example::1".parse::<ArtifactIdentity>().is_err());
    }

    #[test]
    fn rejects_path_traversal_components() {
        let err = ArtifactIdentity::new("org", "..", "1.0", None, "jar").unwrap_err();
        assert!(matches!(err, ArtifactError::InvalidComponent { field: "name", .. }));

        assert!(ArtifactIdentity::new("org", "a/b", "1.0", None, "jar").is_err());
    }

    #[test]
    fn empty_classifier_is_none() {
        let id = ArtifactIdentity::new("org", "a", "1", Some(String::new()), "jar").unwrap();
        assert_eq!(id.classifier(), None);
    }

    #[test]
    fn serde_uses_coordinate_string() {
        let id = mappings();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"org.example:mappings:2026.01.01@zip\"");
        let parsed: ArtifactIdentity = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
