//! The show engine's background worker: reads audio, drives mode policies,
//! and dispatches throttled datagrams.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;

use crate::analysis::Analyzer;
use crate::audio::{AudioSource, WindowResult};
use crate::config::Config;
use crate::lamp::LampTransport;
use crate::protocol_constants::{RESET_BRIGHTNESS, RESET_COLOR};

use super::modes::{drive_from_clock, drive_from_frame, LampTarget, WorkerPhase};
use super::state::{EngineState, Mode};

/// Per-lamp last-send timestamp, owned exclusively by the worker thread.
struct Throttle {
    last_sent: Vec<Option<Instant>>,
    interval: Duration,
}

impl Throttle {
    fn new(n: usize, interval: Duration) -> Self {
        Self { last_sent: vec![None; n], interval }
    }

    /// Returns `true` if a send to `idx` is allowed right now, and records it.
    fn try_take(&mut self, idx: usize) -> bool {
        let now = Instant::now();
        match self.last_sent.get(idx).copied().flatten() {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last_sent[idx] = Some(now);
                true
            }
        }
    }
}

/// Runs the worker loop until `state.config.running` is cleared, or the
/// audio source closes. Intended to run on a dedicated blocking thread
/// (spawned via `spawn_blocking` by [`super::show_engine::ShowEngine`]);
/// bridges into async transport calls via the captured runtime handle.
pub fn run(handle: Handle, transport: Arc<LampTransport>, state: Arc<EngineState>, config: Arc<Config>) {
    let mut audio_source = AudioSource::open(&config.fifo_path);
    let mut analyzer = Analyzer::new();
    let mut phase = WorkerPhase::default();
    let mut throttle = Throttle::new(state.lamp_ips.len(), config.throttle_interval());
    let worker_period = config.worker_period();
    let start = Instant::now();

    loop {
        let t_start = Instant::now();

        let (mode, latency_offset_ms, intensity, running) = {
            let cfg = state.config.read();
            (cfg.mode, cfg.latency_offset_ms, cfg.intensity, cfg.running)
        };

        if !running || mode == Mode::Off {
            break;
        }

        let targets = match audio_source.as_mut() {
            None => drive_from_clock(mode, intensity, start.elapsed().as_secs_f64(), &mut phase),
            Some(source) => match source.read_window() {
                WindowResult::Closed => {
                    // Per the worker-loop contract, a closed source breaks
                    // the loop outright rather than falling back to the
                    // pattern-only branch: Running -> Resetting -> Idle.
                    log::warn!("audio source closed; stopping worker");
                    state.set_pipe_exists(false);
                    break;
                }
                WindowResult::Silent => {
                    drive_from_clock(mode, intensity, start.elapsed().as_secs_f64(), &mut phase)
                }
                WindowResult::Window(samples) => {
                    let frame = analyzer.analyze(&samples);
                    if latency_offset_ms > 0 {
                        std::thread::sleep(Duration::from_millis(latency_offset_ms as u64));
                    }
                    drive_from_frame(mode, intensity, &frame, &mut phase)
                }
            },
        };

        for (idx, target) in targets.iter().enumerate() {
            emit(&handle, &transport, &state.lamp_ips, &mut throttle, idx, *target);
        }

        let elapsed = t_start.elapsed();
        if elapsed < worker_period {
            std::thread::sleep(worker_period - elapsed);
        }
    }

    reset_lamps(&handle, &transport, &state.lamp_ips);
}

/// Dispatches one lamp's color/brightness pair through the throttle.
/// Out-of-range lamp indices are ignored.
fn emit(
    handle: &Handle,
    transport: &Arc<LampTransport>,
    lamp_ips: &[std::net::Ipv4Addr],
    throttle: &mut Throttle,
    idx: usize,
    target: LampTarget,
) {
    let Some(&ip) = lamp_ips.get(idx) else { return };
    if !throttle.try_take(idx) {
        return;
    }

    let brightness = target.brightness.clamp(1, 100);
    let transport = Arc::clone(transport);
    handle.block_on(async move {
        transport.set_color(ip, target.r, target.g, target.b).await;
        transport.set_brightness(ip, brightness).await;
    });
}

/// Issues the reset sequence to every lamp, bypassing the throttle.
fn reset_lamps(handle: &Handle, transport: &Arc<LampTransport>, lamp_ips: &[std::net::Ipv4Addr]) {
    let (r, g, b) = RESET_COLOR;
    for &ip in lamp_ips {
        let transport = Arc::clone(transport);
        handle.block_on(async move {
            transport.set_color(ip, r, g, b).await;
            transport.set_brightness(ip, RESET_BRIGHTNESS).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_INTERVAL: Duration = Duration::from_millis(50);

    #[test]
    fn throttle_suppresses_rapid_repeats() {
        let mut throttle = Throttle::new(1, TEST_INTERVAL);
        assert!(throttle.try_take(0));
        assert!(!throttle.try_take(0));
    }

    #[test]
    fn throttle_out_of_range_index_never_recorded() {
        let throttle = Throttle::new(1, TEST_INTERVAL);
        assert_eq!(throttle.last_sent.len(), 1);
        // idx 5 is out of range for this instance; callers must check length
        // via `lamp_ips.get` before calling `try_take`, which `emit` does.
        assert!(throttle.last_sent.get(5).is_none());
    }

    #[test]
    fn throttle_allows_after_interval_elapses() {
        let mut throttle = Throttle::new(1, TEST_INTERVAL);
        throttle.last_sent[0] = Some(Instant::now() - TEST_INTERVAL - Duration::from_millis(1));
        assert!(throttle.try_take(0));
    }
}
