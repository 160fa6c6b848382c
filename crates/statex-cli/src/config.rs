//! CLI configuration
//!
//! Read from `statex.toml`; every field is optional.

use serde::Deserialize;
use statex_core::logging_facility::Profile;
use statex_core::ImporterConfig;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "statex.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Graph snapshot the commands read and write
    pub graph: PathBuf,
    pub log_profile: Profile,
    pub importer: ImporterConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            graph: PathBuf::from("statex.json"),
            log_profile: Profile::Production,
            importer: ImporterConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load `path`, or `./statex.toml` if it exists, or the defaults
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(toml::from_str(content)?)
    }
}
