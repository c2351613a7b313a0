//! Wire format for the LAN lamp protocol.
//!
//! Every message is a single UTF-8 JSON object in one UDP datagram - no
//! length framing beyond the datagram boundary. This module only builds and
//! parses the JSON payloads; socket I/O lives in [`super::transport`].

use serde::Deserialize;
use serde_json::json;

use super::types::LampStatus;

/// Builds the discovery scan payload sent to the multicast group.
pub fn scan_message() -> serde_json::Value {
    json!({ "msg": { "cmd": "scan", "data": { "account_topic": "reserve" } } })
}

/// A parsed discovery reply naming the lamp that sent it.
#[derive(Debug, Clone, Deserialize)]
struct ScanReplyEnvelope {
    msg: ScanReplyMsg,
}

#[derive(Debug, Clone, Deserialize)]
struct ScanReplyMsg {
    data: ScanReplyData,
}

#[derive(Debug, Clone, Deserialize)]
struct ScanReplyData {
    device: String,
    ip: String,
    sku: String,
}

/// A discovery reply, already shorn of its envelope.
pub struct ScanReply {
    pub device_id: String,
    pub ip: String,
    pub sku: String,
}

/// Parses one discovery reply datagram.
///
/// Returns `None` for malformed or unrecognized payloads; an empty reply set
/// overall is not an error.
pub fn parse_scan_reply(bytes: &[u8]) -> Option<ScanReply> {
    let envelope: ScanReplyEnvelope = serde_json::from_slice(bytes).ok()?;
    let data = envelope.msg.data;
    Some(ScanReply {
        device_id: data.device,
        ip: data.ip,
        sku: data.sku,
    })
}

/// Builds the power (`turn`) command payload.
pub fn turn_message(on: bool) -> serde_json::Value {
    json!({ "msg": { "cmd": "turn", "data": { "value": if on { 1 } else { 0 } } } })
}

/// Builds the brightness command payload. `brightness` must already be
/// clamped to `1..=100` by the caller.
pub fn brightness_message(brightness: u8) -> serde_json::Value {
    json!({ "msg": { "cmd": "brightness", "data": { "value": brightness } } })
}

/// Builds the color command payload (`colorwc` with `colorTemInKelvin: 0`).
pub fn color_message(r: u8, g: u8, b: u8) -> serde_json::Value {
    json!({
        "msg": {
            "cmd": "colorwc",
            "data": { "color": { "r": r, "g": g, "b": b }, "colorTemInKelvin": 0 }
        }
    })
}

/// Builds the color-temperature command payload (`colorwc` with a zeroed color).
pub fn color_temp_message(kelvin: u16) -> serde_json::Value {
    json!({
        "msg": {
            "cmd": "colorwc",
            "data": { "color": { "r": 0, "g": 0, "b": 0 }, "colorTemInKelvin": kelvin }
        }
    })
}

/// Builds the status-query payload.
pub fn status_query_message() -> serde_json::Value {
    json!({ "msg": { "cmd": "devStatus", "data": {} } })
}

#[derive(Debug, Deserialize)]
struct StatusReplyEnvelope {
    msg: StatusReplyMsg,
}

#[derive(Debug, Deserialize)]
struct StatusReplyMsg {
    data: LampStatus,
}

/// Parses a `devStatus` reply, treating absent fields as unknown rather than
/// zero.
pub fn parse_status_reply(bytes: &[u8]) -> Option<LampStatus> {
    let envelope: StatusReplyEnvelope = serde_json::from_slice(bytes).ok()?;
    Some(envelope.msg.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_message_matches_wire_shape() {
        let msg = scan_message();
        assert_eq!(msg["msg"]["cmd"], "scan");
        assert_eq!(msg["msg"]["data"]["account_topic"], "reserve");
    }

    #[test]
    fn parse_scan_reply_extracts_fields() {
        let raw = br#"{"msg":{"data":{"device":"lamp-1","ip":"192.168.1.50","sku":"RGBW1"}}}"#;
        let reply = parse_scan_reply(raw).expect("valid reply");
        assert_eq!(reply.device_id, "lamp-1");
        assert_eq!(reply.ip, "192.168.1.50");
        assert_eq!(reply.sku, "RGBW1");
    }

    #[test]
    fn parse_scan_reply_rejects_malformed() {
        assert!(parse_scan_reply(b"not json").is_none());
        assert!(parse_scan_reply(br#"{"msg":{}}"#).is_none());
    }

    #[test]
    fn turn_message_encodes_bool_as_int() {
        assert_eq!(turn_message(true)["msg"]["data"]["value"], 1);
        assert_eq!(turn_message(false)["msg"]["data"]["value"], 0);
    }

    #[test]
    fn parse_status_reply_missing_fields_are_none() {
        let raw = br#"{"msg":{"data":{"onOff":1}}}"#;
        let status = parse_status_reply(raw).expect("valid reply");
        assert_eq!(status.on, Some(true));
        assert_eq!(status.brightness, None);
        assert_eq!(status.color, None);
        assert_eq!(status.color_temp_kelvin, None);
    }
}
