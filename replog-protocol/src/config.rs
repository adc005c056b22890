//! Codec configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via REPLOG_CONFIG)
//! 3. Environment variables

use crate::error::ConfigError;
use crate::header::HEADER_SIZE;
use crate::MAX_MESSAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How a stream buffer picks its next capacity when it runs out of room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowthPolicy {
    /// Double the capacity, or more if that is still not enough.
    #[default]
    Double,
    /// Grow to exactly what is needed.
    Exact,
}

impl GrowthPolicy {
    /// Capacity to reallocate to when `needed` bytes must fit.
    pub fn next_capacity(self, current: usize, needed: usize) -> usize {
        match self {
            GrowthPolicy::Double => current.saturating_mul(2).max(needed),
            GrowthPolicy::Exact => needed,
        }
    }
}

impl std::str::FromStr for GrowthPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "double" => Ok(GrowthPolicy::Double),
            "exact" => Ok(GrowthPolicy::Exact),
            other => Err(ConfigError::ValidationError(format!(
                "unknown growth policy '{}'",
                other
            ))),
        }
    }
}

/// Settings for [`MessageReader`](crate::codec::MessageReader) and
/// [`MessageWriter`](crate::codec::MessageWriter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Largest declared message size a reader accepts.
    pub max_message_size: usize,
    /// Buffer growth policy.
    pub growth: GrowthPolicy,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_message_size: MAX_MESSAGE_SIZE,
            growth: GrowthPolicy::Double,
        }
    }
}

impl CodecConfig {
    /// Loads configuration from file, then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("REPLOG_CONFIG") {
            config = Self::from_file(&path)?;
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: CodecConfig = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Loads configuration from environment variables only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(size) = std::env::var("REPLOG_MAX_MESSAGE_SIZE") {
            if let Ok(n) = size.parse() {
                self.max_message_size = n;
            }
        }

        if let Ok(growth) = std::env::var("REPLOG_BUFFER_GROWTH") {
            match growth.parse() {
                Ok(policy) => self.growth = policy,
                Err(e) => tracing::warn!("ignoring REPLOG_BUFFER_GROWTH: {}", e),
            }
        }
    }

    /// Checks that the limits can be honoured on the wire.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_message_size < HEADER_SIZE || self.max_message_size > MAX_MESSAGE_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "max_message_size must be between {} and {}, got {}",
                HEADER_SIZE, MAX_MESSAGE_SIZE, self.max_message_size
            )));
        }
        Ok(())
    }

    /// Saves configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CodecConfig::default();
        assert_eq!(config.max_message_size, 65535);
        assert_eq!(config.growth, GrowthPolicy::Double);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_growth_policy() {
        assert_eq!(GrowthPolicy::Double.next_capacity(16, 20), 32);
        assert_eq!(GrowthPolicy::Double.next_capacity(16, 100), 100);
        assert_eq!(GrowthPolicy::Exact.next_capacity(16, 20), 20);
        assert_eq!(GrowthPolicy::Double.next_capacity(usize::MAX, 1), usize::MAX);

        assert_eq!("Exact".parse::<GrowthPolicy>().unwrap(), GrowthPolicy::Exact);
        assert!("triple".parse::<GrowthPolicy>().is_err());
    }

    #[test]
    fn test_validate_bounds() {
        let mut config = CodecConfig {
            max_message_size: 11,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        config.max_message_size = 70_000;
        assert!(config.validate().is_err());

        config.max_message_size = 12;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = CodecConfig {
            max_message_size: 4096,
            growth: GrowthPolicy::Exact,
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("exact"));
        let parsed: CodecConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let parsed: CodecConfig = serde_yaml::from_str("growth: exact\n").unwrap();
        assert_eq!(parsed.growth, GrowthPolicy::Exact);
        assert_eq!(parsed.max_message_size, MAX_MESSAGE_SIZE);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replog.yaml");

        let config = CodecConfig {
            max_message_size: 1024,
            growth: GrowthPolicy::Exact,
        };
        config.save(&path).unwrap();

        let loaded = CodecConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = CodecConfig::from_file(dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(ConfigError::IoError(..))));
    }

    #[test]
    fn test_bad_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "growth: sideways\n").unwrap();

        let result = CodecConfig::from_file(&path);
        assert!(matches!(result, Err(ConfigError::ParseError(..))));
    }
}
