//! Network and timing constants shared across the lamp transport, audio
//! source, analysis stage, and show engine.
//!
//! Kept in one module so that changing a port or deadline never requires
//! hunting through call sites.

use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Lamp LAN protocol
// ─────────────────────────────────────────────────────────────────────────────

/// Multicast group lamps listen on for discovery requests.
pub const DISCOVERY_MULTICAST_ADDR: &str = "239.255.255.250:4001";

/// Port the transport listens on for discovery replies.
pub const DISCOVERY_LISTEN_PORT: u16 = 4002;

/// Port every lamp's control/status endpoint listens on.
pub const LAMP_CONTROL_PORT: u16 = 4003;

/// Deadline for collecting discovery replies after sending the scan datagram.
pub const DISCOVERY_DEADLINE: Duration = Duration::from_secs(3);

/// Deadline for a single `get_status` round trip.
pub const STATUS_DEADLINE: Duration = Duration::from_secs(1);

/// How long a cached lamp record is considered fresh.
pub const CACHE_TTL: Duration = Duration::from_secs(300);

// ─────────────────────────────────────────────────────────────────────────────
// Show engine
// ─────────────────────────────────────────────────────────────────────────────

/// Target worker iteration rate.
pub const WORKER_RATE_HZ: f64 = 30.0;

/// Target period derived from [`WORKER_RATE_HZ`] (~33.3ms).
pub const WORKER_PERIOD: Duration = Duration::from_micros(33_333);

/// Minimum interval between datagrams sent to a single lamp (≤20/s/lamp).
pub const THROTTLE_INTERVAL: Duration = Duration::from_millis(50);

/// Deadline for joining the worker thread after `stop()`.
pub const STOP_JOIN_DEADLINE: Duration = Duration::from_secs(2);

/// Warm-white reset color applied to every lamp when the engine stops.
pub const RESET_COLOR: (u8, u8, u8) = (255, 180, 100);

/// Reset brightness applied alongside [`RESET_COLOR`].
pub const RESET_BRIGHTNESS: u8 = 50;

// ─────────────────────────────────────────────────────────────────────────────
// Analysis stage
// ─────────────────────────────────────────────────────────────────────────────

/// Analysis window size in stereo frames (1024 stereo frames = 2048 samples).
pub const WINDOW_FRAMES: usize = 1024;

/// Analysis window size in mono samples after averaging L/R.
pub const WINDOW_SAMPLES: usize = WINDOW_FRAMES;

/// Bytes per window: 1024 stereo frames * 2 channels * 2 bytes/sample.
pub const WINDOW_BYTES: usize = WINDOW_FRAMES * 2 * 2;

/// Number of bass values retained for the rolling baseline.
pub const BASELINE_LEN: usize = 40;

/// Minimum baseline length before beat detection is armed.
pub const BASELINE_MIN_FOR_BEAT: usize = 5;

/// Beat sensitivity threshold: bass must exceed this multiple of the baseline mean.
pub const BEAT_SENSITIVITY: f32 = 1.4;

/// Sample rate assumed for the PCM stream (44100 Hz).
pub const SAMPLE_RATE_HZ: u32 = 44_100;

/// Bass band bin range `[1, 6)` (~43-258 Hz at this window size/rate).
pub const BASS_BINS: (usize, usize) = (1, 6);

/// Mid band bin range `[6, 93)` (~258-4000 Hz).
pub const MID_BINS: (usize, usize) = (6, 93);

/// Treble band bin range `[93, 372)` (~4000-16000 Hz).
pub const TREBLE_BINS: (usize, usize) = (93, 372);
