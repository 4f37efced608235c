//! Configuration file for the `tapioca` command.
//!
//! The file is TOML with three sections:
//!
//! ```toml
//! [read]
//! parameters_file = "param_1.5.3_2D.txt"
//! filetype = "ascii"
//! datasets = ["temperature", "velocity"]
//!
//! [output]
//! format = "json"
//! pretty = false
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every key is optional. Command-line flags override the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tapioca::{FileType, GridOptions, OutputFormat, ParticleOptions, Quantity, PARAMETERS_FILE};

use crate::error::{Error, Result};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "TAPIOCA_CONFIG";

/// Default log filter when neither `RUST_LOG` nor a flag sets one.
pub const DEFAULT_LOG_LEVEL: &str = "info,tapioca=info";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// How model directories are read.
    pub read: ReadConfig,
    /// How datasets are written.
    pub output: OutputConfig,
    /// Log verbosity.
    pub logging: LoggingConfig,
}

/// `[read]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadConfig {
    /// Parameters file name inside the model directory.
    pub parameters_file: String,
    /// Encoding of field and particle files.
    pub filetype: FileType,
    /// Grid quantities read by `tapioca grid`.
    pub datasets: Vec<Quantity>,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            parameters_file: PARAMETERS_FILE.to_string(),
            filetype: FileType::default(),
            datasets: Quantity::ALL.to_vec(),
        }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Export format.
    pub format: OutputFormat,
    /// Indent JSON output.
    pub pretty: bool,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `tapioca=debug`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Load the configuration.
    ///
    /// Resolution order: `explicit` path, then `$TAPIOCA_CONFIG`, then the
    /// per-user default path. A missing file is an error when it was named
    /// explicitly or through the environment; a missing default file yields
    /// the built-in defaults.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        let env = std::env::var(CONFIG_ENV).ok();
        Self::load_from(explicit, env.as_deref(), default_config_path())
    }

    fn load_from(
        explicit: Option<&str>,
        env: Option<&str>,
        default: Option<PathBuf>,
    ) -> Result<Self> {
        // Empty values count as unset.
        let named = non_empty(explicit).is_some() || non_empty(env).is_some();
        match resolve_path(explicit, env, default) {
            Some(path) if path.exists() => Self::from_file(&path),
            Some(path) if named => Err(Error::config(format!(
                "Config file not found at {}",
                path.display()
            ))),
            _ => Ok(Self::default()),
        }
    }

    /// Read and parse a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(e.to_string()))
    }

    /// Serialize as pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Grid reading options derived from the `[read]` section.
    pub fn grid_options(&self) -> GridOptions {
        GridOptions::new()
            .with_parameters_file(&self.read.parameters_file)
            .with_datasets(self.read.datasets.iter().copied())
            .with_filetype(self.read.filetype)
    }

    /// Particle reading options derived from the `[read]` section.
    pub fn particle_options(&self) -> ParticleOptions {
        ParticleOptions::new()
            .with_parameters_file(&self.read.parameters_file)
            .with_filetype(self.read.filetype)
    }
}

/// Per-user configuration file, e.g. `~/.config/tapioca/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tapioca").join("config.toml"))
}

/// The configuration file `tapioca` would read.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    let env = std::env::var(CONFIG_ENV).ok();
    resolve_path(explicit, env.as_deref(), default_config_path())
}

fn resolve_path(
    explicit: Option<&str>,
    env: Option<&str>,
    default: Option<PathBuf>,
) -> Option<PathBuf> {
    non_empty(explicit)
        .or(non_empty(env))
        .map(PathBuf::from)
        .or(default)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
