//! Band-limited spectral analysis and beat detection.

mod spectrum;

pub use spectrum::{Analyzer, Frame};
