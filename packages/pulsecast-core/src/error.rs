//! Centralized error types for the PulseCast core library.
//!
//! Errors that change contract validity (`NoLampsError`, `BadModeError`,
//! `TransportError`, `ConfigOutOfRange`) are surfaced here. Errors the core
//! can usefully mask
//! into degraded-but-alive behavior (`AudioUnavailable`, dropped datagrams,
//! transient read errors) never reach this type - they are logged at the
//! call site and the core keeps running.

use thiserror::Error;

/// Trait for error types that provide machine-readable error codes.
///
/// Implement this to give a consistent code to errors regardless of which
/// layer produced them, so tests and future API layers don't need to match
/// on `Display` strings.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;
}

/// Application-wide error type for the PulseCast core.
#[derive(Debug, Error)]
pub enum PulseError {
    /// `start` resolved zero lamps from the supplied device ids.
    #[error("no lamps resolved from device ids: {0:?}")]
    NoLamps(Vec<String>),

    /// A mode string or value was not one of `off`, `pulse`, `ambient`, `party`.
    #[error("unrecognized show mode: {0}")]
    BadMode(String),

    /// Discovery could not bind or use its sockets.
    #[error("lamp transport error: {0}")]
    Transport(String),

    /// A configuration value was outside its documented range and could not
    /// be clamped (only `latency_ms` and `mode` are rejected outright, see
    /// [`crate::engine::validate_latency_ms`] and [`crate::config::Config::validate`];
    /// all other out-of-range inputs are clamped instead, see
    /// [`crate::engine::clamp_intensity`] and friends).
    #[error("configuration value out of range: {0}")]
    ConfigOutOfRange(String),
}

impl ErrorCode for PulseError {
    fn code(&self) -> &'static str {
        match self {
            Self::NoLamps(_) => "no_lamps_resolved",
            Self::BadMode(_) => "bad_mode",
            Self::Transport(_) => "transport_error",
            Self::ConfigOutOfRange(_) => "config_out_of_range",
        }
    }
}

/// Convenience alias for core operations.
pub type PulseResult<T> = Result<T, PulseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_lamps_has_stable_code() {
        let err = PulseError::NoLamps(vec!["lamp-1".into()]);
        assert_eq!(err.code(), "no_lamps_resolved");
    }

    #[test]
    fn bad_mode_has_stable_code() {
        let err = PulseError::BadMode("strobe".into());
        assert_eq!(err.code(), "bad_mode");
    }
}
