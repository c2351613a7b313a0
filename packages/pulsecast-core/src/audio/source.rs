//! Named-FIFO audio source.
//!
//! Opens the pipe in non-blocking mode with a raw `O_NONBLOCK` open via
//! `libc` directly under `cfg(unix)`, rather than pulling in a heavier I/O
//! abstraction for a single flag.

use std::fs::File;
use std::io::{self, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use crate::protocol_constants::WINDOW_BYTES;

/// Outcome of one [`AudioSource::read_window`] call.
#[derive(Debug, PartialEq)]
pub enum WindowResult {
    /// A full window of normalized mono samples, ready for analysis.
    Window(Vec<f32>),
    /// Fewer bytes than one window are available right now; the caller
    /// should fall back to the pattern-only branch for this iteration.
    Silent,
    /// The source is unusable and will never produce data again.
    Closed,
}

/// Non-blocking reader over the PCM FIFO.
///
/// Never buffers data across calls: each `read_window` either yields an
/// aligned window or nothing. Partial reads within a window are discarded,
/// never padded, to preserve spectral integrity.
pub struct AudioSource {
    path: PathBuf,
    file: Option<File>,
}

impl AudioSource {
    /// Attempts to open `path` in non-blocking mode.
    ///
    /// A missing path is not an error here; it is the caller's job to treat
    /// `open` returning `None` as "enter pattern-only".
    pub fn open(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return None;
        }
        match open_nonblocking(&path) {
            Ok(file) => Some(Self { path, file: Some(file) }),
            Err(e) => {
                log::warn!("failed to open audio fifo {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads exactly one window (4096 bytes) or reports `Silent`/`Closed`.
    pub fn read_window(&mut self) -> WindowResult {
        let Some(file) = self.file.as_mut() else {
            return WindowResult::Closed;
        };

        let mut buf = [0u8; WINDOW_BYTES];
        let mut filled = 0usize;

        while filled < WINDOW_BYTES {
            match file.read(&mut buf[filled..]) {
                Ok(0) => {
                    // Writer side closed; a named pipe reports EOF this way
                    // rather than an error. Treat as transiently silent -
                    // the source is not closed on its own.
                    return WindowResult::Silent;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return WindowResult::Silent;
                }
                Err(e) => {
                    log::debug!("transient read error on {}: {}", self.path.display(), e);
                    return WindowResult::Silent;
                }
            }
        }

        WindowResult::Window(to_mono_normalized(&buf))
    }
}

/// Reinterprets interleaved s16le stereo bytes as mono samples in `[-1, 1]`.
fn to_mono_normalized(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|frame| {
            let left = i16::from_le_bytes([frame[0], frame[1]]);
            let right = i16::from_le_bytes([frame[2], frame[3]]);
            let mono = (left as i32 + right as i32) as f32 / 2.0;
            mono / 32_768.0
        })
        .collect()
}

#[cfg(unix)]
fn open_nonblocking(path: &Path) -> io::Result<File> {
    std::fs::OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
}

#[cfg(not(unix))]
fn open_nonblocking(path: &Path) -> io::Result<File> {
    std::fs::OpenOptions::new().read(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn open_on_missing_path_returns_none() {
        assert!(AudioSource::open("/nonexistent/path/to/fifo").is_none());
    }

    #[test]
    fn to_mono_normalized_averages_channels_and_scales() {
        // left = 32767 (~full scale), right = 0 -> mono ~= 16383.5 / 32768
        let bytes = [0xff, 0x7f, 0x00, 0x00];
        let mono = to_mono_normalized(&bytes);
        assert_eq!(mono.len(), 1);
        assert!((mono[0] - 0.4999847).abs() < 1e-4);
    }

    #[test]
    fn to_mono_normalized_handles_silence() {
        let bytes = [0u8; 8];
        let mono = to_mono_normalized(&bytes);
        assert_eq!(mono, vec![0.0, 0.0]);
    }

    #[test]
    fn read_window_on_regular_file_with_insufficient_bytes_is_silent() {
        // A regular file (not a real FIFO) never blocks, so a short file
        // reaches EOF immediately - the same outward behavior as a silent
        // pipe, enough to exercise the discard-partial-reads path.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio.fifo");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&[0u8; 10]).unwrap();
        drop(f);

        let mut source = AudioSource::open(&path).expect("file exists, should open");
        assert_eq!(source.read_window(), WindowResult::Silent);
    }

    #[test]
    fn read_window_on_full_window_of_silence_yields_zeroed_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio.fifo");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&vec![0u8; WINDOW_BYTES]).unwrap();
        drop(f);

        let mut source = AudioSource::open(&path).expect("file exists, should open");
        match source.read_window() {
            WindowResult::Window(samples) => {
                assert_eq!(samples.len(), WINDOW_BYTES / 4);
                assert!(samples.iter().all(|&s| s == 0.0));
            }
            other => panic!("expected a full window, got {:?}", other),
        }
    }
}
