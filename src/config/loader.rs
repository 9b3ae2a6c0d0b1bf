//! Config struct and loading logic.
//!
//! Priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables
//! 3. `.prckey.toml` in the working directory
//! 4. `~/.config/prckey/config.toml` (global defaults)
//! 5. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::constants::{
    CONFIG_DIR, CONFIG_FILENAME, DEFAULT_SIGNING_TEMPLATE, ENV_PUBLIC_KEYS_FILE,
    ENV_SIGNING_TEMPLATE,
};
use crate::env::Env;

/// Errors during config loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub public_keys: PublicKeysConfig,
    pub signing: SigningConfig,
}

/// Where the public key table lives when `-a` is not given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicKeysConfig {
    pub file: Option<PathBuf>,
}

/// Settings for the generated signing program sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Source file each private key file `#include`s.
    pub template: String,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_SIGNING_TEMPLATE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration with proper layering.
    ///
    /// Reads from global config, then `work_dir`'s local config, then
    /// applies environment variable overrides.
    pub fn load(work_dir: Option<&Path>, env: &Env) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // Layer 4: global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                config.merge(global);
            }
        }

        // Layer 3: local config
        if let Some(dir) = work_dir {
            let local_path = dir.join(CONFIG_FILENAME);
            if local_path.exists() {
                let local = Self::load_file(&local_path)?;
                config.merge(local);
            }
        }

        // Layer 2: environment variables
        config.apply_env_vars(env);

        debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Load a config from a specific file.
    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the global config file path.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR).join("config.toml"))
    }

    /// Merge another config into this one (other wins for non-default values).
    fn merge(&mut self, other: Config) {
        if other.public_keys.file.is_some() {
            self.public_keys.file = other.public_keys.file;
        }
        if other.signing.template != SigningConfig::default().template {
            self.signing.template = other.signing.template;
        }
    }

    /// Apply environment variable overrides. Empty values are ignored.
    fn apply_env_vars(&mut self, env: &Env) {
        if let Ok(val) = env.var(ENV_PUBLIC_KEYS_FILE) {
            if !val.is_empty() {
                self.public_keys.file = Some(PathBuf::from(val));
            }
        }
        if let Ok(val) = env.var(ENV_SIGNING_TEMPLATE) {
            if !val.is_empty() {
                self.signing.template = val;
            }
        }
    }
}
