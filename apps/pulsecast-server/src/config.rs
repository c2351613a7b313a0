//! Server configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Server configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Path to the named FIFO the audio producer writes PCM to.
    /// Override: `PULSECAST_FIFO_PATH`
    pub fifo_path: PathBuf,

    /// API key for the cloud fallback lamp control path, used only when the
    /// LAN protocol is unavailable. The cloud surface itself is outside this
    /// crate; the key is only carried through configuration.
    /// Override: `PULSECAST_CLOUD_API_KEY`
    pub cloud_api_key: Option<String>,

    /// Device ids to resolve and drive at boot.
    pub device_ids: Vec<String>,

    /// Show mode to start in: `pulse`, `ambient`, or `party`.
    pub default_mode: String,

    /// Default intensity, `1..=10`.
    pub default_intensity: i32,

    /// Default latency offset in milliseconds, `-500..=500`.
    pub default_latency_ms: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            fifo_path: PathBuf::from("/tmp/pulsecast-audio.fifo"),
            cloud_api_key: None,
            device_ids: Vec::new(),
            default_mode: "pulse".to_string(),
            default_intensity: 5,
            default_latency_ms: 0,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&std::path::Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("PULSECAST_FIFO_PATH") {
            self.fifo_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("PULSECAST_CLOUD_API_KEY") {
            self.cloud_api_key = Some(val);
        }

        if let Ok(val) = std::env::var("PULSECAST_DEVICE_IDS") {
            self.device_ids = val.split(',').map(|s| s.trim().to_string()).collect();
        }
    }

    /// Rejects configuration values that fall outside their documented
    /// ranges and cannot be silently clamped at this layer (the engine
    /// itself clamps `intensity`/`latency_ms` once running; this check
    /// catches nonsense at startup before a worker ever spawns).
    fn validate(&self) -> Result<()> {
        if !(1..=10).contains(&self.default_intensity) {
            anyhow::bail!("default_intensity must be in 1..=10, got {}", self.default_intensity);
        }
        if !(-500..=500).contains(&self.default_latency_ms) {
            anyhow::bail!("default_latency_ms must be in -500..=500, got {}", self.default_latency_ms);
        }
        Ok(())
    }

    /// Converts to pulsecast-core's `Config` type.
    pub fn to_core_config(&self) -> pulsecast_core::Config {
        pulsecast_core::Config {
            fifo_path: self.fifo_path.clone(),
            cloud_api_key: self.cloud_api_key.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_intensity_fails_validation() {
        let mut config = ServerConfig::default();
        config.default_intensity = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_latency_fails_validation() {
        let mut config = ServerConfig::default();
        config.default_latency_ms = -900;
        assert!(config.validate().is_err());
    }
}
