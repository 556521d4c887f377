use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::graph::NormalizeOptions;
use crate::graph::stats::DEFAULT_MOST_REQUIRED_LIMIT;

/// Project config location, relative to the project root.
pub const PROJECT_CONFIG_PATH: &str = ".strata/config.toml";

/// Analysis settings read from `.strata/config.toml`.
///
/// ```toml
/// [normalize]
/// separator = "::"
/// resolve_descendants = false
///
/// [report]
/// most_required_limit = 10
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub normalize: NormalizeOptions,
    #[serde(default)]
    pub report: ReportOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOptions {
    /// Length of the `most_required` ranking in the stats block.
    #[serde(default = "default_most_required_limit")]
    pub most_required_limit: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            most_required_limit: default_most_required_limit(),
        }
    }
}

/// Per-user preferences from `<config_dir>/strata/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Preferred output mode: `pretty`, `text` or `json`.
    #[serde(default)]
    pub output: Option<String>,
}

/// Load the project config under `project_root`, or defaults if absent.
///
/// # Errors
///
/// Returns [`Error::ConfigRead`] or [`Error::ConfigParse`] if the file exists
/// but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<AnalysisConfig> {
    read_toml_or_default(&project_root.join(PROJECT_CONFIG_PATH))
}

/// Load the user config, or defaults if there is no config directory or file.
///
/// # Errors
///
/// Returns [`Error::ConfigRead`] or [`Error::ConfigParse`] if the file exists
/// but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(path) = user_config_path() else {
        return Ok(UserConfig::default());
    };
    read_toml_or_default(&path)
}

/// Location of the user config file, if the platform has a config directory.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("strata/config.toml"))
}

/// Map a configured output mode onto its canonical name.
///
/// Accepts `human` and `table` as aliases for `pretty` and `text`.
#[must_use]
pub fn normalize_output_mode(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" | "human" => Some("pretty"),
        "text" | "table" => Some("text"),
        "json" => Some("json"),
        _ => None,
    }
}

fn read_toml_or_default<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str::<T>(&content).map_err(|source| Error::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

const fn default_most_required_limit() -> usize {
    DEFAULT_MOST_REQUIRED_LIMIT
}
