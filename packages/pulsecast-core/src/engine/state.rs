//! Show engine state and its lifecycle types.

use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::error::{PulseError, PulseResult};

/// A named visual mode. `Off` is not a worker mode; it is the absence of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Off,
    Pulse,
    Ambient,
    Party,
}

impl FromStr for Mode {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(Mode::Off),
            "pulse" => Ok(Mode::Pulse),
            "ambient" => Ok(Mode::Ambient),
            "party" => Ok(Mode::Party),
            other => Err(PulseError::BadMode(other.to_string())),
        }
    }
}

/// Clamps intensity into the documented `[1, 10]` range rather than
/// rejecting it.
pub fn clamp_intensity(intensity: i32) -> u8 {
    intensity.clamp(1, 10) as u8
}

/// Validates a latency offset against the documented `[-500, 500]` ms range.
///
/// Unlike `intensity`/`brightness`/`kelvin`, an out-of-range `latency_ms` is
/// not clamped (§6/§7): it is rejected with `ConfigOutOfRange` so the caller
/// learns its input was invalid instead of having it silently reinterpreted.
pub fn validate_latency_ms(latency_ms: i32) -> PulseResult<i32> {
    if (-500..=500).contains(&latency_ms) {
        Ok(latency_ms)
    } else {
        Err(PulseError::ConfigOutOfRange(format!(
            "latency_ms must be in -500..=500, got {}",
            latency_ms
        )))
    }
}

/// Supervisor-mutated configuration (`mode`, `latency_offset_ms`,
/// `intensity`, `running`), read by the worker once per iteration.
pub struct EngineConfig {
    pub mode: Mode,
    pub latency_offset_ms: i32,
    pub intensity: u8,
    pub running: bool,
}

/// Full engine state shared between the supervisor and the worker.
///
/// `lamp_ips` is set once at `start` and never mutated afterward, so it needs
/// no lock. `config` is behind a single `RwLock` so the worker never observes
/// a torn read across `mode`/`latency_offset_ms`/`intensity`/`running`.
pub struct EngineState {
    pub lamp_ips: Vec<Ipv4Addr>,
    pub config: RwLock<EngineConfig>,
    /// Whether the audio source is currently open. Set at `start` and
    /// cleared by the worker if the source later closes.
    pipe_exists: AtomicBool,
}

impl EngineState {
    pub fn new(
        lamp_ips: Vec<Ipv4Addr>,
        mode: Mode,
        latency_offset_ms: i32,
        intensity: u8,
        pipe_exists: bool,
    ) -> Self {
        Self {
            lamp_ips,
            config: RwLock::new(EngineConfig {
                mode,
                latency_offset_ms,
                intensity,
                running: true,
            }),
            pipe_exists: AtomicBool::new(pipe_exists),
        }
    }

    pub fn pipe_exists(&self) -> bool {
        self.pipe_exists.load(Ordering::Relaxed)
    }

    pub fn set_pipe_exists(&self, exists: bool) {
        self.pipe_exists.store(exists, Ordering::Relaxed);
    }
}

/// Snapshot returned by `status()`.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineStatus {
    pub active: bool,
    pub mode: Option<&'static str>,
    pub latency_ms: i32,
    pub intensity: u8,
    pub lights_connected: usize,
    pub pipe_exists: bool,
}

impl Mode {
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            Mode::Off => None,
            Mode::Pulse => Some("pulse"),
            Mode::Ambient => Some("ambient"),
            Mode::Party => Some("party"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_from_str_accepts_known_modes() {
        assert_eq!("pulse".parse::<Mode>().unwrap(), Mode::Pulse);
        assert_eq!("ambient".parse::<Mode>().unwrap(), Mode::Ambient);
        assert_eq!("party".parse::<Mode>().unwrap(), Mode::Party);
        assert_eq!("off".parse::<Mode>().unwrap(), Mode::Off);
    }

    #[test]
    fn mode_from_str_rejects_unknown() {
        let err = "strobe".parse::<Mode>().unwrap_err();
        assert!(matches!(err, PulseError::BadMode(m) if m == "strobe"));
    }

    #[test]
    fn clamp_intensity_clamps_rather_than_rejects() {
        assert_eq!(clamp_intensity(0), 1);
        assert_eq!(clamp_intensity(15), 10);
        assert_eq!(clamp_intensity(5), 5);
    }

    #[test]
    fn validate_latency_accepts_boundary_values() {
        assert_eq!(validate_latency_ms(-500).unwrap(), -500);
        assert_eq!(validate_latency_ms(500).unwrap(), 500);
        assert_eq!(validate_latency_ms(10).unwrap(), 10);
    }

    #[test]
    fn validate_latency_rejects_out_of_range() {
        assert!(matches!(
            validate_latency_ms(-1000),
            Err(PulseError::ConfigOutOfRange(_))
        ));
        assert!(matches!(
            validate_latency_ms(1000),
            Err(PulseError::ConfigOutOfRange(_))
        ));
    }
}
