//! LAN lamp transport: discovery, caching, and fire-and-forget datagram control.
//!
//! A short-lived UDP socket sends a broadcast/multicast query, a receive loop
//! collects replies for a fixed deadline, and a `tokio::sync::Mutex` serializes
//! concurrent scans so only one is ever in flight.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::timeout;

use crate::config::Config;

use super::cache::DeviceCache;
use super::protocol;
use super::types::{LampRecord, LampStatus, TransportError, TransportResult};

/// LAN transport for discovering and driving lamps.
///
/// Holds the device cache and a scan lock; everything else is stateless, with
/// a fresh UDP socket created and disposed for each control/status operation.
pub struct LampTransport {
    config: Arc<Config>,
    cache: DeviceCache,
    scan_lock: AsyncMutex<()>,
}

impl LampTransport {
    pub fn new(config: Arc<Config>) -> Self {
        let cache = DeviceCache::new(config.cache_ttl());
        Self {
            config,
            cache,
            scan_lock: AsyncMutex::new(()),
        }
    }

    /// Discovers lamps on the LAN, or returns the cached set if `!force` and
    /// the cache is fresh (`discover`).
    pub async fn discover(&self, force: bool) -> TransportResult<Vec<LampRecord>> {
        if !force && self.cache.is_fresh() {
            return Ok(self.cache.snapshot());
        }

        // Only one scan runs at a time; a caller that arrives while another
        // scan is in flight waits for it and then reuses its result rather
        // than issuing a second network scan.
        let _guard = self.scan_lock.lock().await;
        if !force && self.cache.is_fresh() {
            return Ok(self.cache.snapshot());
        }

        let lamps = self.scan().await?;
        self.cache.replace(lamps.clone());
        Ok(lamps)
    }

    async fn scan(&self) -> TransportResult<Vec<LampRecord>> {
        let socket = bind_discovery_listener(self.config.discovery_listen_port)?;

        let payload = serde_json::to_vec(&protocol::scan_message()).unwrap_or_default();
        socket
            .send_to(&payload, self.config.discovery_multicast_addr.as_str())
            .await
            .map_err(TransportError::Send)?;

        let mut lamps = Vec::new();
        let mut buf = [0u8; 2048];
        let deadline = tokio::time::Instant::now() + self.config.discovery_deadline();

        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                break;
            }
            match timeout(remaining, socket.recv_from(&mut buf)).await {
                Ok(Ok((n, src))) => {
                    if let Some(reply) = protocol::parse_scan_reply(&buf[..n]) {
                        log::debug!("discovery reply from {}: device={}", src, reply.device_id);
                        let ip: Ipv4Addr = match reply.ip.parse() {
                            Ok(ip) => ip,
                            Err(_) => {
                                log::debug!("dropping discovery reply with unparsable ip: {}", reply.ip);
                                continue;
                            }
                        };
                        lamps.push(LampRecord {
                            device_id: reply.device_id,
                            ip,
                            sku: reply.sku,
                        });
                    } else {
                        log::debug!("dropping malformed discovery reply from {}", src);
                    }
                }
                Ok(Err(e)) => {
                    log::warn!("discovery recv error: {}", e);
                }
                Err(_) => break,
            }
        }

        log::debug!("discovery scan complete: {} lamp(s) found", lamps.len());
        Ok(lamps)
    }

    /// Forces a fresh scan regardless of cache freshness (supplemented
    /// convenience wrapper; suggests callers outside the core may
    /// want this after a failed control sequence).
    pub async fn force_rescan(&self) -> TransportResult<Vec<LampRecord>> {
        self.discover(true).await
    }

    /// Resolves a device id to its IP, retrying one discovery on a cache miss
    /// (`get_ip`).
    pub async fn get_ip(&self, device_id: &str) -> Option<Ipv4Addr> {
        if let Some(ip) = self.cache.get_ip(device_id) {
            return Some(ip);
        }
        if self.discover(false).await.is_err() {
            return None;
        }
        self.cache.get_ip(device_id)
    }

    async fn send_control(&self, ip: Ipv4Addr, payload: serde_json::Value) {
        let result = async {
            let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
            let bytes = serde_json::to_vec(&payload).unwrap_or_default();
            socket.send_to(&bytes, (ip, self.config.lamp_control_port)).await?;
            Ok::<_, std::io::Error>(())
        }
        .await;

        // Fire-and-forget: a send failure is logged only, never propagated
        // (`SendDropped`).
        if let Err(e) = result {
            log::warn!("dropped datagram to {}: {}", ip, e);
        }
    }

    /// Sends a power command. Clamping is not needed; `on` has no out-of-range values.
    pub async fn turn(&self, ip: Ipv4Addr, on: bool) {
        self.send_control(ip, protocol::turn_message(on)).await;
    }

    /// Sends a brightness command, clamping to `1..=100`.
    pub async fn set_brightness(&self, ip: Ipv4Addr, brightness: u8) {
        let clamped = brightness.clamp(1, 100);
        self.send_control(ip, protocol::brightness_message(clamped)).await;
    }

    /// Sends a color command.
    pub async fn set_color(&self, ip: Ipv4Addr, r: u8, g: u8, b: u8) {
        self.send_control(ip, protocol::color_message(r, g, b)).await;
    }

    /// Sends a color-temperature command, clamping to `2000..=9000` Kelvin.
    pub async fn set_color_temp(&self, ip: Ipv4Addr, kelvin: u16) {
        let clamped = kelvin.clamp(2000, 9000);
        self.send_control(ip, protocol::color_temp_message(clamped)).await;
    }

    /// Queries a lamp's status, waiting up to the configured status deadline
    /// for a reply.
    pub async fn get_status(&self, ip: Ipv4Addr) -> Option<LampStatus> {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).await.ok()?;
        let payload = serde_json::to_vec(&protocol::status_query_message()).unwrap_or_default();
        socket
            .send_to(&payload, (ip, self.config.lamp_control_port))
            .await
            .ok()?;

        let mut buf = [0u8; 2048];
        match timeout(self.config.status_deadline(), socket.recv_from(&mut buf)).await {
            Ok(Ok((n, _src))) => protocol::parse_status_reply(&buf[..n]),
            Ok(Err(e)) => {
                log::warn!("status query to {} failed: {}", ip, e);
                None
            }
            Err(_) => {
                log::debug!("status query to {} timed out", ip);
                None
            }
        }
    }
}

/// Binds the discovery-reply listen socket with `SO_REUSEADDR` set, per
/// spec's "Scan socket binds the listen port with address reuse" edge
/// policy, then hands it off to tokio.
fn bind_discovery_listener(port: u16) -> TransportResult<UdpSocket> {
    let addr: SocketAddr = (Ipv4Addr::UNSPECIFIED, port).into();

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .map_err(TransportError::SocketBind)?;
    socket.set_reuse_address(true).map_err(TransportError::SocketBind)?;
    socket.set_nonblocking(true).map_err(TransportError::SocketBind)?;
    socket.bind(&addr.into()).map_err(TransportError::SocketBind)?;

    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket).map_err(TransportError::SocketBind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> LampTransport {
        LampTransport::new(Arc::new(Config::default()))
    }

    #[tokio::test]
    async fn discover_without_prior_scan_hits_network() {
        // With no cached lamps, `discover(false)` must attempt a real scan.
        // No lamps answer here, so it returns an empty set rather than
        // treating an empty reply set as an error.
        let transport = transport();
        let lamps = transport.discover(false).await.expect("scan should not error");
        assert!(lamps.is_empty());
    }

    #[tokio::test]
    async fn get_ip_on_unknown_device_returns_none() {
        let transport = transport();
        assert_eq!(transport.get_ip("nonexistent-device").await, None);
    }
}
