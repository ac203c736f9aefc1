//! Project configuration (`asset-deps.toml`).
//!
//! The file is optional; every section has defaults.
//!
//! ```toml
//! # Extra extension (or file name) to type mappings
//! [extensions]
//! "browser.json" = "package"
//! jsx = "js"
//!
//! # Extensions the host loads without a registered require extension
//! [require]
//! innate-extensions = [".js", ".json"]
//!
//! # Expand glob descriptors before any other normalizer
//! [glob]
//! enabled = true
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::debug;

use crate::constants::{CONFIG_FILE_NAME, DEFAULT_INNATE_REQUIRE_EXTENSIONS};
use crate::core::AssetDepsError;

fn default_innate_extensions() -> Vec<String> {
    DEFAULT_INNATE_REQUIRE_EXTENSIONS.iter().map(|ext| (*ext).to_string()).collect()
}

const fn default_true() -> bool {
    true
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Extension or literal file name → type name, applied after the
    /// built-in mappings.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, String>,

    /// Require extension settings.
    #[serde(default)]
    pub require: RequireConfig,

    /// Glob expansion settings.
    #[serde(default)]
    pub glob: GlobConfig,
}

/// `[require]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RequireConfig {
    /// Extensions always reported by `get_require_extension_names`.
    #[serde(default = "default_innate_extensions")]
    pub innate_extensions: Vec<String>,
}

impl Default for RequireConfig {
    fn default() -> Self {
        Self {
            innate_extensions: default_innate_extensions(),
        }
    }
}

/// `[glob]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GlobConfig {
    /// Whether the glob normalizer runs.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for GlobConfig {
    fn default() -> Self {
        Self {
            enabled: true,
        }
    }
}

impl Config {
    /// Loads the configuration from `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, or with
    /// [`AssetDepsError::ConfigParse`] if it is not valid configuration TOML.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config = Self::parse(&content).map_err(|error| AssetDepsError::ConfigParse {
            file: path.display().to_string(),
            reason: error.message().to_string(),
        })?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Loads `asset-deps.toml` from `dir`, or the defaults if there is none.
    ///
    /// # Errors
    ///
    /// Same as [`load_from`](Self::load_from) when the file exists.
    pub async fn load_or_default(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load_from(&path).await
        } else {
            debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, dir.display());
            Ok(Self::default())
        }
    }

    /// Parses configuration TOML.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
