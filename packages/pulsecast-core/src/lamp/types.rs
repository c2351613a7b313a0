//! Domain types for LAN lamps: identity, discovery replies, and status.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque lamp identity assigned by the manufacturer firmware.
pub type DeviceId = String;

/// A lamp record as maintained by the device cache.
///
/// Two lamp records may never share an identity; the cache is keyed by
/// `device_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LampRecord {
    /// Opaque device identity reported by the lamp itself.
    pub device_id: DeviceId,
    /// Reachable IPv4 address.
    pub ip: Ipv4Addr,
    /// Opaque SKU/model string reported by the lamp.
    pub sku: String,
}

/// Snapshot of a lamp's reported state.
///
/// Every field is optional: some firmware variants omit fields in their
/// `devStatus` reply, and a missing field must be treated as "unknown", not
/// as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LampStatus {
    #[serde(rename = "onOff", default, deserialize_with = "deserialize_on_off")]
    pub on: Option<bool>,
    pub brightness: Option<u8>,
    pub color: Option<LampColor>,
    #[serde(rename = "colorTemInKelvin")]
    pub color_temp_kelvin: Option<u16>,
}

/// The wire protocol represents on/off as `0`/`1`, not a JSON bool; an absent
/// field stays `None` rather than defaulting to "off".
fn deserialize_on_off<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<u8> = Option::deserialize(deserializer)?;
    Ok(raw.map(|v| v != 0))
}

/// An RGB triple as reported by or sent to a lamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LampColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Errors raised by the lamp transport (`TransportError`).
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to bind a UDP socket for discovery or control.
    #[error("failed to bind UDP socket: {0}")]
    SocketBind(#[source] std::io::Error),

    /// A send to a lamp or the multicast group failed outright (as opposed to
    /// the fire-and-forget `SendDropped` case, which is only logged).
    #[error("failed to send datagram: {0}")]
    Send(#[source] std::io::Error),
}

pub type TransportResult<T> = Result<T, TransportError>;
