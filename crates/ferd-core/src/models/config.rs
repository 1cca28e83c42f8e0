//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};

/// Main configuration for ferd.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FerdConfig {
    /// Extraction configuration.
    pub extraction: ExtractionConfig,

    /// Output/presentation configuration.
    pub output: OutputConfig,
}

/// Extraction engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// File name suffix identifying the invoice attachment (case-insensitive).
    pub attachment_suffix: String,

    /// Accept documents carrying a DOCTYPE declaration.
    pub allow_dtd: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            attachment_suffix: ".xml".to_string(),
            allow_dtd: false,
        }
    }
}

/// Rendering configuration used by presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Marker rendered for fields without a value.
    pub not_available: String,

    /// Include the raw XML in JSON output.
    pub include_raw_xml: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            not_available: "not available".to_string(),
            include_raw_xml: false,
        }
    }
}

impl FerdConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: FerdConfig =
            serde_json::from_str(r#"{"output": {"not_available": "n/a"}}"#).unwrap();
        assert_eq!(config.output.not_available, "n/a");
        assert!(!config.output.include_raw_xml);
        assert_eq!(config.extraction, ExtractionConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = FerdConfig::default();
        config.extraction.allow_dtd = true;
        config.save(&path).unwrap();

        assert_eq!(FerdConfig::from_file(&path).unwrap(), config);
    }
}
