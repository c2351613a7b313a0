//! Light-show engine: owns the background worker that drives lamps from
//! analysis frames or a fallback pattern under a chosen mode.

mod modes;
mod show_engine;
mod state;
mod worker;

pub use modes::{hsv_to_rgb, LampTarget};
pub use show_engine::ShowEngine;
pub use state::{clamp_intensity, validate_latency_ms, EngineConfig, EngineState, EngineStatus, Mode};
