use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::reset::ResetPolicy;
use crate::styles::{DotSizeRule, Palette};

/// Coordinator settings. Every field is optional in JSON and falls back to
/// the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
    pub reset: ResetPolicy,
    pub dot_size: DotSizeRule,
    pub palette: Palette,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "reading map config: {e}"),
            ConfigError::Parse(e) => write!(f, "parsing map config: {e}"),
            ConfigError::Invalid(msg) => write!(f, "invalid map config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl MapConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: MapConfig = serde_json::from_str(s).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratio = self.reset.min_area_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(ConfigError::Invalid(format!(
                "reset.min_area_ratio must be within [0, 1], got {ratio}"
            )));
        }
        if self.dot_size.few_below > self.dot_size.some_below {
            return Err(ConfigError::Invalid(
                "dot_size.few_below must not exceed dot_size.some_below".to_string(),
            ));
        }
        Ok(())
    }
}
