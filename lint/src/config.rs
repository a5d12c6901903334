//! Tool configuration.
//!
//! Defines the YAML-serializable configuration shared by the `check` and
//! `decode` commands. Every section is optional; a missing file means
//! defaults.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! decode:
//!   disable_transform_keys: false
//! check:
//!   quiet: false
//!   exclude:
//!     - legacy.yml
//! ```

use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::Path;

use json_mapper_core::DecodeOptions;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Current configuration format version.
pub const CONFIG_VERSION: &str = "1.0";

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "json-mapper.yml";

/// Settings for the declaration checker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Hide violation details; only the exit status reports the outcome.
    #[serde(default)]
    pub quiet: bool,
    /// Declaration file names to skip.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Top-level configuration.
///
/// # Examples
///
/// ```
/// use json_mapper_lint::MapperConfig;
///
/// let config: MapperConfig = serde_yaml::from_str("decode:\n  disable_transform_keys: true\n").unwrap();
/// assert!(config.decode.disable_transform_keys);
/// assert!(config.check.exclude.is_empty());
/// assert_eq!(config.version, "1.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Configuration format version (e.g., `"1.0"`).
    #[serde(default = "default_version")]
    pub version: String,
    /// Options applied to every decode call.
    #[serde(default)]
    pub decode: DecodeOptions,
    /// Declaration checker settings.
    #[serde(default)]
    pub check: CheckConfig,
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            decode: DecodeOptions::default(),
            check: CheckConfig::default(),
        }
    }
}

impl MapperConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::LintError::IoError) if the file cannot be
    /// read, or [`YamlError`](crate::LintError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Loads configuration, falling back to defaults when the file does not
    /// exist.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load) for every failure other than a missing
    /// file.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::File::open(path) {
            Ok(file) => Ok(serde_yaml::from_reader(BufReader::new(file))?),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::LintError::IoError) if the file cannot be
    /// written, or [`YamlError`](crate::LintError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Returns `true` if the file name of `path` is in the exclusion list.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            return false;
        };
        self.check.exclude.iter().any(|excluded| excluded == name)
    }
}
