//! Store and tool configuration.
//!
//! Defines the YAML-serializable configuration that tells the tools where
//! man page data lives and which programs must never be explained.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! sources:
//!   directories:
//!     - manpages/
//!   bundles:
//!     - manpages.json
//! exclude:
//!   - dangerous-tool
//! extraction:
//!   jobs: 4
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Where man pages are loaded from, tried in order: directories first, then
/// bundles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Directories of `*.json` man page files.
    #[serde(default)]
    pub directories: Vec<PathBuf>,
    /// [`ManPagePackage`](explain_core::ManPagePackage) bundle files.
    #[serde(default)]
    pub bundles: Vec<PathBuf>,
}

/// Settings for batch option extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Number of parallel extraction jobs.
    pub jobs: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { jobs: 4 }
    }
}

/// Top-level configuration, typically `.explain.yml`.
///
/// # Examples
///
/// ```
/// # let yaml = r#"
/// # version: "1.0"
/// # sources: { directories: [manpages/] }
/// # exclude: [dangerous-tool]
/// # "#;
/// # let config: explain_db::ExplainConfig = serde_yaml::from_str(yaml).unwrap();
/// assert!(config.is_excluded("dangerous-tool"));
/// assert!(!config.is_excluded("ls"));
/// assert_eq!(config.extraction.jobs, 4);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    /// Man page sources.
    #[serde(default)]
    pub sources: SourcesConfig,
    /// Programs whose man pages are dropped from the store.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Extraction settings.
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

impl ExplainConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::StoreError::IoError) if the file cannot be
    /// read, or [`YamlError`](crate::StoreError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::StoreError::IoError) if the file cannot be
    /// written, or [`YamlError`](crate::StoreError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Returns `true` if `program` is in the exclusion list.
    pub fn is_excluded(&self, program: &str) -> bool {
        self.exclude.iter().any(|p| p == program)
    }
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            sources: SourcesConfig::default(),
            exclude: Vec::new(),
            extraction: ExtractionConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
version: "1.0"
sources:
  directories: [a/, b/]
  bundles: [pages.json]
exclude:
  - dangerous-tool
extraction:
  jobs: 8
"#;
        let config: ExplainConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sources.directories.len(), 2);
        assert_eq!(config.sources.bundles, [PathBuf::from("pages.json")]);
        assert_eq!(config.extraction.jobs, 8);
        assert!(config.is_excluded("dangerous-tool"));
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: ExplainConfig = serde_yaml::from_str("version: \"1.0\"\n").unwrap();
        assert!(config.sources.directories.is_empty());
        assert!(config.exclude.is_empty());
        assert_eq!(config.extraction.jobs, 4);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("explain.yml");

        let mut config = ExplainConfig::default();
        config.exclude.push("rm".into());
        config.sources.bundles.push("pages.json".into());
        config.save(&path).unwrap();

        let loaded = ExplainConfig::load(&path).unwrap();
        assert!(loaded.is_excluded("rm"));
        assert_eq!(loaded.sources.bundles, [PathBuf::from("pages.json")]);
    }
}
