//! PulseCast Core - audio-reactive LAN lamp controller.
//!
//! This crate drives two LAN-attached RGB lamps from a real-time audio
//! analysis pipeline: a named FIFO of raw PCM is windowed, transformed into
//! band energies and a beat flag, and translated into per-lamp color and
//! brightness under a chosen visual mode, with a time-based fallback pattern
//! when no audio is available.
//!
//! # Architecture
//!
//! - [`lamp`]: LAN lamp discovery, caching, and datagram control
//! - [`audio`]: non-blocking FIFO reader yielding fixed-size PCM windows
//! - [`analysis`]: windowed FFT spectral analysis and beat detection
//! - [`engine`]: the supervised background worker and its mode policies
//! - [`error`]: centralized error types
//! - [`config`]: crate-wide tunable configuration
//! - [`protocol_constants`]: shared network and timing constants
//!
//! The crate exposes no HTTP surface of its own; it is meant to be driven by
//! a supervising process (see `pulsecast-server` for a minimal example).

pub mod analysis;
pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod lamp;
pub mod protocol_constants;

pub use analysis::{Analyzer, Frame};
pub use audio::{AudioSource, WindowResult};
pub use config::Config;
pub use engine::{hsv_to_rgb, EngineStatus, LampTarget, Mode, ShowEngine};
pub use error::{ErrorCode, PulseError, PulseResult};
pub use lamp::{DeviceId, LampColor, LampRecord, LampStatus, LampTransport, TransportError};
