// init_config.rs
// Handles loading the optional startup file (fieldlines.toml): settings plus an initial scene

use crate::charge::ChargeSpec;
use crate::config::{ChargeStyle, EvalParams, DEFAULT_INIT_CONFIG};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct InitConfig {
    pub eval: EvalParams,
    pub style: ChargeStyle,
    /// Scene file loaded before `charges` are appended
    pub scene: Option<PathBuf>,
    pub charges: Vec<ChargeSpec>,
}

impl InitConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load `fieldlines.toml` from the working directory, if present.
    pub fn load_default() -> Result<Option<Self>, ConfigError> {
        let path = Path::new(DEFAULT_INIT_CONFIG);
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from_file(path).map(Some)
    }
}
