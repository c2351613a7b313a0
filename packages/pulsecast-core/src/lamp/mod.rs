//! LAN lamp controller: discovery, caching, and datagram control.

mod cache;
mod protocol;
mod transport;
mod types;

pub use transport::LampTransport;
pub use types::{DeviceId, LampColor, LampRecord, LampStatus, TransportError, TransportResult};
