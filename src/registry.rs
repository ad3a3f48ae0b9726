//! The fixed, ordered list of feed endpoints the tracker polls.

use std::collections::HashSet;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// MTA subway feed groups as `(line name, environment variable)`, in the
/// order they are reported.
pub const MTA_LINES: &[(&str, &str)] = &[
    ("ACESr", "ACESr"),
    ("BDFMSf", "BDFMsf"),
    ("G", "G"),
    ("JZ", "JZ"),
    ("NQRW", "NQRW"),
    ("L", "L"),
    ("1234567S", "1234567S"),
    ("SIR", "SIR"),
];

/// One upstream feed. An empty `url` means the endpoint is not configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

impl Source {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// Ordered, validated set of sources. Built once at startup.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<Source>,
}

impl SourceRegistry {
    /// Validates names (non-empty, unique) and that at least one source exists.
    /// Endpoints are not checked here; a missing one fails only that source.
    pub fn new(sources: Vec<Source>) -> Result<Self> {
        if sources.is_empty() {
            bail!("source registry is empty");
        }

        let mut seen = HashSet::new();
        for source in &sources {
            if source.name.trim().is_empty() {
                bail!("source registry contains an entry without a name");
            }
            if !seen.insert(source.name.as_str()) {
                bail!("duplicate source name '{}'", source.name);
            }
        }

        Ok(Self { sources })
    }

    /// Resolves the MTA lines through `lookup`, typically the process
    /// environment. Unresolved lines keep an empty endpoint.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let sources = MTA_LINES
            .iter()
            .map(|(name, key)| Source::new(*name, lookup(key).unwrap_or_default()))
            .collect();
        Self::new(sources)
    }

    /// Resolves the MTA lines from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the registry from a JSON file holding an ordered array:
    /// ```json
    /// [
    ///   { "name": "G", "url": "https://example.org/feeds/g" },
    ///   { "name": "L", "url": "https://example.org/feeds/l" }
    /// ]
    /// ```
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let sources: Vec<Source> = serde_json::from_str(content)?;
        Self::new(sources)
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_lookup_keeps_line_order() {
        let env: HashMap<&str, &str> = [("G", "http://feeds/g"), ("BDFMsf", "http://feeds/bdfm")]
            .into_iter()
            .collect();
        let registry =
            SourceRegistry::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();

        let names: Vec<_> = registry.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["ACESr", "BDFMSf", "G", "JZ", "NQRW", "L", "1234567S", "SIR"]
        );
        assert_eq!(registry.sources()[1].url, "http://feeds/bdfm");
        assert_eq!(registry.sources()[2].url, "http://feeds/g");
    }

    #[test]
    fn test_unset_endpoint_is_kept_unconfigured() {
        let registry = SourceRegistry::from_lookup(|_| None).unwrap();
        assert_eq!(registry.len(), MTA_LINES.len());
        assert!(registry.iter().all(|s| !s.is_configured()));
    }

    #[test]
    fn test_from_json_preserves_order() {
        let registry = SourceRegistry::from_json(
            r#"[{"name": "L", "url": "http://l"}, {"name": "G", "url": "http://g"}, {"name": "SIR"}]"#,
        )
        .unwrap();

        let names: Vec<_> = registry.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["L", "G", "SIR"]);
        assert!(!registry.sources()[2].is_configured());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = SourceRegistry::new(vec![Source::new("G", "a"), Source::new("G", "b")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_registry_rejected() {
        assert!(SourceRegistry::new(vec![]).is_err());
        assert!(SourceRegistry::from_json("[]").is_err());
    }

    #[test]
    fn test_unnamed_source_rejected() {
        assert!(SourceRegistry::new(vec![Source::new(" ", "http://x")]).is_err());
    }
}
