//! Configuration for the schema writer and the export tool
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (event-schemas.toml)
//! - Environment variables (EVENT_SCHEMAS__*)
//!
//! ## Example config file (event-schemas.toml):
//! ```toml
//! [writer]
//! output_format = "compact"
//!
//! [export]
//! include_checksums = true
//! output_dir = "./schemas"
//! descriptor_extensions = ["json", "toml"]
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Writer settings
    #[serde(default)]
    pub writer: WriterConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,
}

/// Writer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Output format (pretty or compact)
    #[serde(default)]
    pub output_format: OutputFormat,
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Write a checksums.sha256 manifest next to the exported documents
    #[serde(default = "default_true")]
    pub include_checksums: bool,

    /// Directory exported documents are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File extensions recognised as type descriptors
    #[serde(default = "default_descriptor_extensions")]
    pub descriptor_extensions: Vec<String>,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Pretty,
    #[default]
    Compact,
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("schemas")
}

fn default_descriptor_extensions() -> Vec<String> {
    vec!["json".to_string(), "toml".to_string()]
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            include_checksums: true,
            output_dir: default_output_dir(),
            descriptor_extensions: default_descriptor_extensions(),
        }
    }
}

impl ExportConfig {
    /// Whether a file looks like a type descriptor
    pub fn is_descriptor(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.descriptor_extensions
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

impl SchemaConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the default locations
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "event-schemas.toml",
            ".event-schemas.toml",
            "config/event-schemas.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "familiar", "event-schemas") {
            let xdg_config = dirs.config_dir().join("event-schemas.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("EVENT_SCHEMAS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
