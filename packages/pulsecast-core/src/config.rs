//! Crate-wide configuration: tunables for the lamp transport, audio source,
//! and show engine, with serde support for the app's YAML layer.
//!
//! Values that are fixed by the protocol or the algorithm itself (window
//! size, band bins, beat sensitivity, reset color) stay as constants in
//! [`crate::protocol_constants`] - only the knobs a deployment might
//! reasonably override live here.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PulseError, PulseResult};
use crate::protocol_constants::{
    CACHE_TTL, DISCOVERY_DEADLINE, DISCOVERY_LISTEN_PORT, DISCOVERY_MULTICAST_ADDR,
    LAMP_CONTROL_PORT, STATUS_DEADLINE, THROTTLE_INTERVAL, WORKER_RATE_HZ,
};

/// Crate-wide configuration, loaded by an embedding application (see
/// `pulsecast-server`'s `ServerConfig::to_core_config`) and passed into
/// [`crate::lamp::LampTransport`] and [`crate::engine::ShowEngine`] at
/// construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the named FIFO the audio producer writes PCM to.
    pub fifo_path: PathBuf,

    /// Multicast group + port lamps listen on for discovery requests.
    pub discovery_multicast_addr: String,

    /// Port the transport listens on for discovery replies.
    pub discovery_listen_port: u16,

    /// Port every lamp's control/status endpoint listens on.
    pub lamp_control_port: u16,

    /// Deadline for collecting discovery replies, in seconds.
    pub discovery_deadline_secs: u64,

    /// Deadline for a single `get_status` round trip, in seconds.
    pub status_deadline_secs: u64,

    /// How long a cached lamp record is considered fresh, in seconds.
    pub cache_ttl_secs: u64,

    /// Minimum interval between datagrams sent to a single lamp, in
    /// milliseconds.
    pub throttle_interval_ms: u64,

    /// Target worker iteration rate, in Hz.
    pub worker_rate_hz: f64,

    /// API key for the cloud fallback lamp control path, used only when the
    /// LAN protocol is unavailable. The cloud surface itself is outside this
    /// crate; the key is only carried through configuration.
    pub cloud_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fifo_path: PathBuf::from("/tmp/pulsecast-audio.fifo"),
            discovery_multicast_addr: DISCOVERY_MULTICAST_ADDR.to_string(),
            discovery_listen_port: DISCOVERY_LISTEN_PORT,
            lamp_control_port: LAMP_CONTROL_PORT,
            discovery_deadline_secs: DISCOVERY_DEADLINE.as_secs(),
            status_deadline_secs: STATUS_DEADLINE.as_secs(),
            cache_ttl_secs: CACHE_TTL.as_secs(),
            throttle_interval_ms: THROTTLE_INTERVAL.as_millis() as u64,
            worker_rate_hz: WORKER_RATE_HZ,
            cloud_api_key: None,
        }
    }
}

impl Config {
    /// Rejects configuration values that would make the transport or worker
    /// misbehave at runtime (a zero deadline never times out meaningfully, a
    /// zero throttle interval defeats the flood cap, a non-positive worker
    /// rate divides by zero when turned into a period).
    pub fn validate(&self) -> PulseResult<()> {
        if self.discovery_listen_port == 0 {
            return Err(PulseError::ConfigOutOfRange(
                "discovery_listen_port must be nonzero".to_string(),
            ));
        }
        if self.lamp_control_port == 0 {
            return Err(PulseError::ConfigOutOfRange(
                "lamp_control_port must be nonzero".to_string(),
            ));
        }
        if self.discovery_deadline_secs == 0 {
            return Err(PulseError::ConfigOutOfRange(
                "discovery_deadline_secs must be >= 1".to_string(),
            ));
        }
        if self.status_deadline_secs == 0 {
            return Err(PulseError::ConfigOutOfRange(
                "status_deadline_secs must be >= 1".to_string(),
            ));
        }
        if self.cache_ttl_secs == 0 {
            return Err(PulseError::ConfigOutOfRange(
                "cache_ttl_secs must be >= 1".to_string(),
            ));
        }
        if self.throttle_interval_ms == 0 {
            return Err(PulseError::ConfigOutOfRange(
                "throttle_interval_ms must be >= 1".to_string(),
            ));
        }
        if !(self.worker_rate_hz > 0.0) {
            return Err(PulseError::ConfigOutOfRange(
                "worker_rate_hz must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn discovery_deadline(&self) -> Duration {
        Duration::from_secs(self.discovery_deadline_secs)
    }

    pub fn status_deadline(&self) -> Duration {
        Duration::from_secs(self.status_deadline_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_interval_ms)
    }

    /// Target worker loop period derived from `worker_rate_hz` (~33.3ms at
    /// the default 30Hz).
    pub fn worker_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.worker_rate_hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_throttle_interval_is_rejected() {
        let mut config = Config::default();
        config.throttle_interval_ms = 0;
        assert!(matches!(config.validate(), Err(PulseError::ConfigOutOfRange(_))));
    }

    #[test]
    fn zero_worker_rate_is_rejected() {
        let mut config = Config::default();
        config.worker_rate_hz = 0.0;
        assert!(matches!(config.validate(), Err(PulseError::ConfigOutOfRange(_))));
    }

    #[test]
    fn zero_cache_ttl_is_rejected() {
        let mut config = Config::default();
        config.cache_ttl_secs = 0;
        assert!(matches!(config.validate(), Err(PulseError::ConfigOutOfRange(_))));
    }

    #[test]
    fn worker_period_matches_default_30hz() {
        let config = Config::default();
        let period = config.worker_period();
        assert!((period.as_secs_f64() - 1.0 / 30.0).abs() < 1e-9);
    }
}
