//! Minimal POM generation

use crate::domain::ArtifactIdentity;
use crate::storage::xml_escape;

/// Renders a POM for `artifact` with the given packaging
pub fn render_pom(
    artifact: &ArtifactIdentity,
    packaging: &str,
    description: Option<&str>,
) -> String {
    let mut pom = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <project xmlns=\"http://maven.apache.org/POM/4.0.0\" \
         xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" \
         xsi:schemaLocation=\"http://maven.apache.org/POM/4.0.0 \
         http://maven.apache.org/xsd/maven-4.0.0.xsd\">\n",
    );
    pom.push_str("  <modelVersion>4.0.0</modelVersion>\n");
    pom.push_str(&format!("  <groupId>{}</groupId>\n", xml_escape(artifact.group())));
    pom.push_str(&format!("  <artifactId>{}</artifactId>\n", xml_escape(artifact.name())));
    pom.push_str(&format!("  <version>{}</version>\n", xml_escape(artifact.version())));
    pom.push_str(&format!("  <packaging>{}</packaging>\n", xml_escape(packaging)));
    if let Some(description) = description {
        pom.push_str(&format!(
            "  <description>{}</description>\n",
            xml_escape(description)
        ));
    }
    pom.push_str("</project>\n");
    pom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_coordinates() {
        let artifact: ArtifactIdentity =
            "org.example:mappings:2026.01.01-1.12@pom".parse().unwrap();
        let pom = render_pom(&artifact, "zip", Some("Mappings & more"));

        assert!(pom.contains("<groupId>org.example</groupId>"));
        assert!(pom.contains("<artifactId>mappings</artifactId>"));
        assert!(pom.contains("<version>2026.01.01-1.12</version>"));
        assert!(pom.contains("<packaging>zip</packaging>"));
        assert!(pom.contains("<description>Mappings &amp; more</description>"));
    }

    #[test]
    fn description_is_optional() {
        let artifact: ArtifactIdentity = "g:a:1@pom".parse().unwrap();
        assert!(!render_pom(&artifact, "jar", None).contains("<description>"));
    }
}
