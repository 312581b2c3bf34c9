//! Typed view over the fields of an addon manifest that the dashboard shows
//!
//! The cache stores manifests as opaque JSON. Consumers that need to render
//! an addon (name, version, logo) extract a `ManifestSummary` from it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Summary of an addon manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestSummary {
    /// Addon identifier, e.g. `com.linvo.cinemeta`
    pub id: String,
    /// Human-readable addon name
    pub name: String,
    /// Addon version string
    pub version: String,
    /// Optional description
    pub description: Option<String>,
    /// Optional logo URL
    pub logo: Option<String>,
    /// Content types the addon serves (movie, series, ...)
    pub types: Vec<String>,
    /// Names of the resources the addon provides (catalog, meta, stream, ...)
    pub resources: Vec<String>,
}

/// Manifest fields as they appear on the wire
#[derive(Debug, Deserialize)]
struct RawManifest {
    id: String,
    name: String,
    version: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    logo: Option<String>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    resources: Vec<RawResource>,
}

/// A resource is either a bare name or an object with a `name` field
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawResource {
    Name(String),
    Detailed { name: String },
}

impl ManifestSummary {
    /// Extracts a summary from a manifest document
    ///
    /// Returns `None` if `id`, `name` or `version` is missing or not a string.
    /// Unknown fields are ignored.
    pub fn from_value(value: &Value) -> Option<Self> {
        let raw = RawManifest::deserialize(value).ok()?;
        let resources = raw
            .resources
            .into_iter()
            .map(|r| match r {
                RawResource::Name(name) | RawResource::Detailed { name } => name,
            })
            .collect();

        Some(Self {
            id: raw.id,
            name: raw.name,
            version: raw.version,
            description: raw.description,
            logo: raw.logo,
            types: raw.types,
            resources,
        })
    }

    /// Formats the summary as a single display line
    pub fn display_line(&self) -> String {
        let mut line = format!("{} v{} ({})", self.name, self.version, self.id);
        if !self.resources.is_empty() {
            line.push_str(&format!(" [{}]", self.resources.join(", ")));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_full_manifest() {
        let manifest = json!({
            "id": "com.linvo.cinemeta",
            "name": "Cinemeta",
            "version": "3.0.13",
            "description": "The official addon for movie and series catalogs",
            "logo": "https://example.com/logo.png",
            "types": ["movie", "series"],
            "resources": ["catalog", {"name": "meta", "types": ["movie"]}],
            "catalogs": []
        });

        let summary = ManifestSummary::from_value(&manifest).expect("should parse");

        assert_eq!(summary.id, "com.linvo.cinemeta");
        assert_eq!(summary.name, "Cinemeta");
        assert_eq!(summary.version, "3.0.13");
        assert_eq!(summary.logo.as_deref(), Some("https://example.com/logo.png"));
        assert_eq!(summary.types, vec!["movie", "series"]);
        assert_eq!(summary.resources, vec!["catalog", "meta"]);
    }

    #[test]
    fn test_from_value_minimal_manifest() {
        let manifest = json!({"id": "a", "name": "A", "version": "1.0.0"});

        let summary = ManifestSummary::from_value(&manifest).expect("should parse");

        assert!(summary.description.is_none());
        assert!(summary.types.is_empty());
        assert!(summary.resources.is_empty());
    }

    #[test]
    fn test_from_value_missing_required_field() {
        assert!(ManifestSummary::from_value(&json!({"id": "a", "name": "A"})).is_none());
        assert!(ManifestSummary::from_value(&json!({"id": 1, "name": "A", "version": "1"})).is_none());
        assert!(ManifestSummary::from_value(&json!([1, 2, 3])).is_none());
    }

    #[test]
    fn test_display_line() {
        let manifest = json!({
            "id": "org.example.streams",
            "name": "Streams",
            "version": "0.2.0",
            "resources": ["stream"]
        });

        let summary = ManifestSummary::from_value(&manifest).unwrap();

        assert_eq!(
            summary.display_line(),
            "Streams v0.2.0 (org.example.streams) [stream]"
        );
    }
}
