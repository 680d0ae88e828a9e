//! Text framing for Engine.IO v4 packets and the socket.io packets they carry.
//!
//! Engine.IO frame: `<type digit><payload>`, e.g. `2` (ping), `4...` (message).
//! socket.io packet (inside a message):
//! `<type digit>[<attachments>-][<namespace>,][<ack id>][<json>]`, e.g.
//! `42["log-entry",{...}]` or `40/admin,{"sid":"x"}`.

use crate::Result;
use anyhow::{Context, anyhow, bail};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;

/// Handshake body of the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenHandshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    pub ping_interval: u64,
    pub ping_timeout: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(OpenHandshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        payload: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        ack_id: Option<u64>,
        name: String,
        data: Value,
    },
    Ack {
        namespace: String,
        ack_id: Option<u64>,
        data: Value,
    },
    ConnectError {
        namespace: String,
        message: String,
    },
}

pub const DEFAULT_NAMESPACE: &str = "/";

pub fn decode_engine(frame: &str) -> Result<EnginePacket> {
    let mut chars = frame.chars();
    let kind = chars
        .next()
        .ok_or_else(|| anyhow!("empty engine.io frame"))?;
    let body = chars.as_str();

    Ok(match kind {
        '0' => EnginePacket::Open(
            serde_json::from_str(body).with_context(|| format!("bad open handshake: {:?}", body))?,
        ),
        '1' => EnginePacket::Close,
        '2' => EnginePacket::Ping(body.to_string()),
        '3' => EnginePacket::Pong(body.to_string()),
        '4' => EnginePacket::Message(body.to_string()),
        '5' => EnginePacket::Upgrade,
        '6' => EnginePacket::Noop,
        other => bail!("unknown engine.io packet type {:?} in frame {:?}", other, frame),
    })
}

fn socket_packet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 1) type, 2) binary attachment count, 3) namespace, 4) ack id, 5) json body
    RE.get_or_init(|| {
        Regex::new(r#"(?s)^([0-6])(?:(\d+)-)?(?:(/[^,]*),)?(\d+)?(.*)$"#)
            .expect("socket.io packet regex is valid")
    })
}

pub fn decode_socket(packet: &str) -> Result<SocketPacket> {
    let caps = socket_packet_re()
        .captures(packet)
        .ok_or_else(|| anyhow!("cannot parse socket.io packet: {:?}", packet))?;

    let kind = caps.get(1).map_or("", |m| m.as_str());
    if caps.get(2).is_some() {
        bail!("binary socket.io packets are not supported: {:?}", packet);
    }
    let namespace = caps
        .get(3)
        .map_or(DEFAULT_NAMESPACE, |m| m.as_str())
        .to_string();
    let ack_id = caps
        .get(4)
        .map(|m| m.as_str().parse::<u64>())
        .transpose()
        .with_context(|| format!("bad ack id in {:?}", packet))?;
    let body = caps.get(5).map_or("", |m| m.as_str()).trim();

    let json = if body.is_empty() {
        None
    } else {
        Some(
            serde_json::from_str::<Value>(body)
                .with_context(|| format!("bad socket.io payload: {:?}", body))?,
        )
    };

    Ok(match kind {
        "0" => SocketPacket::Connect {
            namespace,
            payload: json,
        },
        "1" => SocketPacket::Disconnect { namespace },
        "2" => {
            let mut args = match json {
                Some(Value::Array(args)) => args.into_iter(),
                _ => bail!("socket.io event payload must be an array: {:?}", packet),
            };
            let name = match args.next() {
                Some(Value::String(name)) => name,
                _ => bail!("socket.io event is missing its name: {:?}", packet),
            };
            SocketPacket::Event {
                namespace,
                ack_id,
                name,
                data: args.next().unwrap_or(Value::Null),
            }
        }
        "3" => SocketPacket::Ack {
            namespace,
            ack_id,
            data: json.unwrap_or(Value::Null),
        },
        "4" => {
            let message = match &json {
                Some(Value::Object(map)) => map
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                Some(Value::String(s)) => s.clone(),
                _ => String::new(),
            };
            SocketPacket::ConnectError { namespace, message }
        }
        other => bail!("unsupported socket.io packet type {} in {:?}", other, packet),
    })
}

pub fn encode_pong(payload: &str) -> String {
    format!("3{}", payload)
}

/// Engine.IO message carrying a socket.io namespace connect.
pub fn encode_connect(namespace: &str) -> String {
    if namespace == DEFAULT_NAMESPACE {
        "40".to_string()
    } else {
        format!("40{},", namespace)
    }
}

/// Engine.IO message carrying a socket.io event on the default namespace.
pub fn encode_event(name: &str, data: &Value) -> String {
    format!("42{}", Value::Array(vec![Value::String(name.to_string()), data.clone()]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn engine_open() {
        let pkt = decode_engine(
            r#"0{"sid":"lv_VI97HAXpY6yYWAAAC","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#,
        )
        .unwrap();
        assert_eq!(
            pkt,
            EnginePacket::Open(OpenHandshake {
                sid: "lv_VI97HAXpY6yYWAAAC".to_string(),
                upgrades: vec![],
                ping_interval: 25000,
                ping_timeout: 20000,
            })
        );
    }

    #[test]
    fn engine_control_frames() {
        assert_eq!(decode_engine("2").unwrap(), EnginePacket::Ping(String::new()));
        assert_eq!(decode_engine("3probe").unwrap(), EnginePacket::Pong("probe".to_string()));
        assert_eq!(decode_engine("1").unwrap(), EnginePacket::Close);
        assert_eq!(decode_engine("6").unwrap(), EnginePacket::Noop);
        assert_eq!(
            decode_engine("42[\"x\"]").unwrap(),
            EnginePacket::Message("2[\"x\"]".to_string())
        );
        assert!(decode_engine("").is_err());
        assert!(decode_engine("9").is_err());
        assert!(decode_engine("0{not json").is_err());
    }

    #[test]
    fn socket_connect_variants() {
        assert_eq!(
            decode_socket("0").unwrap(),
            SocketPacket::Connect {
                namespace: "/".to_string(),
                payload: None,
            }
        );
        assert_eq!(
            decode_socket(r#"0/admin,{"sid":"abc"}"#).unwrap(),
            SocketPacket::Connect {
                namespace: "/admin".to_string(),
                payload: Some(json!({"sid": "abc"})),
            }
        );
    }

    #[test]
    fn socket_event() {
        let pkt = decode_socket(r#"2["contact-change",{"id":4,"op":"insert"}]"#).unwrap();
        assert_eq!(
            pkt,
            SocketPacket::Event {
                namespace: "/".to_string(),
                ack_id: None,
                name: "contact-change".to_string(),
                data: json!({"id": 4, "op": "insert"}),
            }
        );
    }

    #[test]
    fn socket_event_with_namespace_and_ack() {
        let pkt = decode_socket(r#"2/logs,17["log-entry"]"#).unwrap();
        assert_eq!(
            pkt,
            SocketPacket::Event {
                namespace: "/logs".to_string(),
                ack_id: Some(17),
                name: "log-entry".to_string(),
                data: Value::Null,
            }
        );
    }

    #[test]
    fn socket_connect_error_and_disconnect() {
        assert_eq!(
            decode_socket(r#"4{"message":"Not authorized"}"#).unwrap(),
            SocketPacket::ConnectError {
                namespace: "/".to_string(),
                message: "Not authorized".to_string(),
            }
        );
        assert_eq!(
            decode_socket("1").unwrap(),
            SocketPacket::Disconnect {
                namespace: "/".to_string()
            }
        );
    }

    #[test]
    fn socket_rejects_malformed() {
        assert!(decode_socket(r#"2{"not":"array"}"#).is_err());
        assert!(decode_socket("2[42]").is_err());
        assert!(decode_socket(r#"51-["upload",{"_placeholder":true,"num":0}]"#).is_err());
        assert!(decode_socket("x").is_err());
    }

    #[test]
    fn encoders() {
        assert_eq!(encode_pong(""), "3");
        assert_eq!(encode_connect("/"), "40");
        assert_eq!(encode_connect("/admin"), "40/admin,");
        assert_eq!(encode_event("ping", &json!({"a": 1})), r#"42["ping",{"a":1}]"#);
    }
}
