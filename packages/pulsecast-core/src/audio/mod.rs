//! Audio source: non-blocking FIFO reader yielding fixed-size PCM windows.

mod source;

pub use source::{AudioSource, WindowResult};
