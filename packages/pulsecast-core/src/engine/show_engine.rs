//! Lifecycle owner of the light-show worker: start/stop, live reconfiguration,
//! and status reporting.

use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::{PulseError, PulseResult};
use crate::lamp::LampTransport;
use crate::protocol_constants::STOP_JOIN_DEADLINE;

use super::state::{clamp_intensity, validate_latency_ms, EngineState, EngineStatus, Mode};
use super::worker;

struct Running {
    state: Arc<EngineState>,
    handle: JoinHandle<()>,
}

/// Owns the lifecycle of the background worker: **Idle → Running →
/// Resetting → Idle**. All public methods are
/// async and serialize against each other via an internal async mutex, so
/// `start`/`stop` calls from the supervisor never race.
pub struct ShowEngine {
    transport: Arc<LampTransport>,
    config: Arc<Config>,
    running: AsyncMutex<Option<Running>>,
}

impl ShowEngine {
    pub fn new(transport: Arc<LampTransport>, config: Arc<Config>) -> Self {
        Self {
            transport,
            config,
            running: AsyncMutex::new(None),
        }
    }

    /// Starts (or reconfigures) the show engine (`start`).
    ///
    /// Resolves every device id through the transport; fails with
    /// `NoLampsError` if none resolve. If already running, this call is
    /// treated as a configuration update rather than a restart.
    pub async fn start(
        &self,
        mode: &str,
        device_ids: &[String],
        latency_ms: i32,
        intensity: i32,
    ) -> PulseResult<()> {
        let mode = Mode::from_str(mode)?;
        if mode == Mode::Off {
            // `start`'s mode must be one of the three visual modes (§6); `off`
            // is reached through `stop`/`set_mode`, not a startable mode.
            return Err(PulseError::BadMode("off".to_string()));
        }
        let latency_ms = validate_latency_ms(latency_ms)?;
        let intensity = clamp_intensity(intensity);

        let mut guard = self.running.lock().await;

        if let Some(running) = guard.as_ref() {
            let mut cfg = running.state.config.write();
            cfg.mode = mode;
            cfg.latency_offset_ms = latency_ms;
            cfg.intensity = intensity;
            return Ok(());
        }

        let mut lamp_ips: Vec<Ipv4Addr> = Vec::new();
        for device_id in device_ids {
            if let Some(ip) = self.transport.get_ip(device_id).await {
                lamp_ips.push(ip);
            }
        }
        if lamp_ips.is_empty() {
            return Err(PulseError::NoLamps(device_ids.to_vec()));
        }

        for &ip in &lamp_ips {
            self.transport.turn(ip, true).await;
        }

        let pipe_exists = self.config.fifo_path.exists();
        let state = Arc::new(EngineState::new(lamp_ips, mode, latency_ms, intensity, pipe_exists));

        let handle = Handle::current();
        let transport = Arc::clone(&self.transport);
        let worker_state = Arc::clone(&state);
        let worker_config = Arc::clone(&self.config);
        let join = tokio::task::spawn_blocking(move || {
            worker::run(handle, transport, worker_state, worker_config);
        });

        *guard = Some(Running { state, handle: join });
        Ok(())
    }

    /// Stops the engine, joining the worker with a 2s deadline and emitting a
    /// reset command per lamp (`stop`).
    pub async fn stop(&self) {
        let mut guard = self.running.lock().await;
        let Some(running) = guard.take() else { return };

        {
            let mut cfg = running.state.config.write();
            cfg.running = false;
        }

        // The worker observes `running=false` on its next iteration and
        // performs the reset itself before returning; we just wait for it.
        match tokio::time::timeout(STOP_JOIN_DEADLINE, running.handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::warn!("worker task ended abnormally: {}", e),
            Err(_) => log::warn!("worker did not join within {:?}", STOP_JOIN_DEADLINE),
        }
    }

    /// Updates the show mode without a full restart (`set_mode`).
    /// `mode = "off"` stops the engine (the worker is not necessarily joined
    /// synchronously; a subsequent `stop()` is harmless and idempotent).
    pub async fn set_mode(&self, mode: &str) -> PulseResult<()> {
        let mode = Mode::from_str(mode)?;
        if mode == Mode::Off {
            self.stop().await;
            return Ok(());
        }
        let guard = self.running.lock().await;
        if let Some(running) = guard.as_ref() {
            running.state.config.write().mode = mode;
        }
        Ok(())
    }

    /// Updates the latency offset (`set_latency`), rejecting values outside
    /// `[-500, 500]` rather than clamping them.
    pub async fn set_latency(&self, latency_ms: i32) -> PulseResult<()> {
        let latency_ms = validate_latency_ms(latency_ms)?;
        let guard = self.running.lock().await;
        if let Some(running) = guard.as_ref() {
            running.state.config.write().latency_offset_ms = latency_ms;
        }
        Ok(())
    }

    /// Updates the intensity scale (`set_intensity`).
    pub async fn set_intensity(&self, intensity: i32) {
        let intensity = clamp_intensity(intensity);
        let guard = self.running.lock().await;
        if let Some(running) = guard.as_ref() {
            running.state.config.write().intensity = intensity;
        }
    }

    /// Returns a snapshot of the current engine status (`status`).
    pub async fn status(&self) -> EngineStatus {
        let guard = self.running.lock().await;
        match guard.as_ref() {
            Some(running) => {
                let cfg = running.state.config.read();
                EngineStatus {
                    active: cfg.running && cfg.mode != Mode::Off,
                    mode: cfg.mode.as_str(),
                    latency_ms: cfg.latency_offset_ms,
                    intensity: cfg.intensity,
                    lights_connected: running.state.lamp_ips.len(),
                    pipe_exists: running.state.pipe_exists(),
                }
            }
            None => EngineStatus {
                active: false,
                mode: None,
                latency_ms: 0,
                intensity: 0,
                lights_connected: 0,
                pipe_exists: self.config.fifo_path.exists(),
            },
        }
    }
}
