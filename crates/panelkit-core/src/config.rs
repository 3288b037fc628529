use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_MAX_NAME_LENGTH: usize = 25;
pub const DEFAULT_MAX_BODY_LENGTH: usize = 2048;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{field} must be greater than zero")]
    ZeroLimit { field: &'static str },
}

/// Maximum character counts applied to submitted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextLimits {
    pub max_name_length: usize,
    pub max_body_length: usize,
}

impl Default for TextLimits {
    fn default() -> Self {
        Self {
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            max_body_length: DEFAULT_MAX_BODY_LENGTH,
        }
    }
}

impl TextLimits {
    pub fn new(max_name_length: usize, max_body_length: usize) -> Result<Self, ConfigError> {
        let limits = Self {
            max_name_length,
            max_body_length,
        };
        limits.validate()?;
        Ok(limits)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_name_length == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "max_name_length",
            });
        }
        if self.max_body_length == 0 {
            return Err(ConfigError::ZeroLimit {
                field: "max_body_length",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub news: TextLimits,
    pub catalog_path: Option<PathBuf>,
}

pub fn parse_config(contents: &str) -> Result<PanelConfig, ConfigError> {
    let config: PanelConfig = toml::from_str(contents)?;
    config.news.validate()?;
    Ok(config)
}

/// Loads the panel config, falling back to defaults when the file is absent.
pub fn load_config(path: &Path) -> Result<PanelConfig, ConfigError> {
    if !path.exists() {
        return Ok(PanelConfig::default());
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&contents)
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = env::var("PANELKIT_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    config_dir().join("panelkit/config.toml")
}

fn config_dir() -> PathBuf {
    if let Ok(path) = env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(path);
    }
    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".config")
}
