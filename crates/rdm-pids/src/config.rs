// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Loader configuration.
//!
//! Supports programmatic, environment and TOML file configuration.
//!
//! ```toml
//! validate = true
//! data_dir = "/usr/local/share/ola/pids"
//! file_extension = "proto"
//! overrides_file = "overrides.proto"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// Installed location of the PID data files.
pub const DEFAULT_DATA_LOCATION: &str = "/usr/share/ola/pids";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "RDM_PID_DATA_DIR";

/// Environment variable toggling validation ("0"/"false" disables it).
pub const VALIDATE_ENV: &str = "RDM_PID_VALIDATE";

/// Returns the location of the installed PID data.
pub fn data_location() -> &'static Path {
    Path::new(DEFAULT_DATA_LOCATION)
}

/// How PID data is located and checked while loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Run semantic checks on the loaded data. Turning this off trades
    /// safety for load time; uniqueness is always enforced.
    #[serde(default = "default_true")]
    pub validate: bool,

    /// Directory holding the PID data (None = [`data_location`]).
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Extension of PID data files in a directory.
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// File name of the local overrides, applied after all other files.
    #[serde(default = "default_overrides_file")]
    pub overrides_file: String,
}

fn default_true() -> bool {
    true
}

fn default_file_extension() -> String {
    "proto".to_string()
}

fn default_overrides_file() -> String {
    "overrides.proto".to_string()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            validate: true,
            data_dir: None,
            file_extension: default_file_extension(),
            overrides_file: default_overrides_file(),
        }
    }
}

impl LoaderConfig {
    /// Create a new config builder
    pub fn builder() -> LoaderConfigBuilder {
        LoaderConfigBuilder::default()
    }

    /// Defaults, overridden by `RDM_PID_DATA_DIR` and `RDM_PID_VALIDATE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
            config.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(flag) = lookup(VALIDATE_ENV) {
            let flag = flag.trim().to_ascii_lowercase();
            config.validate = !matches!(flag.as_str(), "0" | "false" | "no" | "off");
        }
        config
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| LoadError::Config(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Reject settings the loader cannot work with.
    pub fn check(&self) -> Result<(), LoadError> {
        if self.file_extension.is_empty() || self.file_extension.starts_with('.') {
            return Err(LoadError::Config(format!(
                "file_extension must be non-empty and without a leading dot: {:?}",
                self.file_extension
            )));
        }
        if self.overrides_file.is_empty() || self.overrides_file.contains(['/', '\\']) {
            return Err(LoadError::Config(format!(
                "overrides_file must be a plain file name: {:?}",
                self.overrides_file
            )));
        }
        Ok(())
    }

    /// The directory to load from.
    pub fn data_dir(&self) -> &Path {
        self.data_dir.as_deref().unwrap_or_else(|| data_location())
    }
}

/// Config builder for fluent API
#[derive(Debug, Default)]
pub struct LoaderConfigBuilder {
    validate: Option<bool>,
    data_dir: Option<PathBuf>,
    file_extension: Option<String>,
    overrides_file: Option<String>,
}

impl LoaderConfigBuilder {
    /// Enable or disable validation (default: true)
    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = Some(validate);
        self
    }

    /// Set the data directory
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Set the data file extension (default: "proto")
    pub fn file_extension(mut self, ext: impl Into<String>) -> Self {
        self.file_extension = Some(ext.into());
        self
    }

    /// Set the overrides file name (default: "overrides.proto")
    pub fn overrides_file(mut self, name: impl Into<String>) -> Self {
        self.overrides_file = Some(name.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> LoaderConfig {
        let defaults = LoaderConfig::default();

        LoaderConfig {
            validate: self.validate.unwrap_or(defaults.validate),
            data_dir: self.data_dir.or(defaults.data_dir),
            file_extension: self.file_extension.unwrap_or(defaults.file_extension),
            overrides_file: self.overrides_file.unwrap_or(defaults.overrides_file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_defaults() {
        let config = LoaderConfig::default();

        assert!(config.validate);
        assert_eq!(config.data_dir(), Path::new("/usr/share/ola/pids"));
        assert_eq!(config.file_extension, "proto");
        assert_eq!(config.overrides_file, "overrides.proto");
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = LoaderConfig::builder()
            .validate(false)
            .data_dir("/opt/pids")
            .file_extension("pids")
            .overrides_file("local.pids")
            .build();

        assert!(!config.validate);
        assert_eq!(config.data_dir(), Path::new("/opt/pids"));
        assert_eq!(config.file_extension, "pids");
        assert_eq!(config.overrides_file, "local.pids");
    }

    #[test]
    fn test_config_from_lookup() {
        let env: HashMap<&str, &str> =
            [(DATA_DIR_ENV, "/tmp/pids"), (VALIDATE_ENV, "false")].into();
        let config = LoaderConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.data_dir(), Path::new("/tmp/pids"));
        assert!(!config.validate);

        let config = LoaderConfig::from_lookup(|_| None);
        assert_eq!(config, LoaderConfig::default());

        let config = LoaderConfig::from_lookup(|k| (k == VALIDATE_ENV).then(|| "yes".to_string()));
        assert!(config.validate);
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pids.toml");
        std::fs::write(&path, "validate = false\ndata_dir = \"/srv/pids\"\n").unwrap();

        let config = LoaderConfig::from_file(&path).unwrap();
        assert!(!config.validate);
        assert_eq!(config.data_dir(), Path::new("/srv/pids"));
        assert_eq!(config.overrides_file, "overrides.proto");
    }

    #[test]
    fn test_config_from_file_rejects_bad_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pids.toml");
        std::fs::write(&path, "file_extension = \".proto\"\n").unwrap();

        let err = LoaderConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, LoadError::Config(_)));
    }

    #[test]
    fn test_config_from_missing_file() {
        let err = LoaderConfig::from_file("/nonexistent/pids.toml").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
