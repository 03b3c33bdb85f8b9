//! Wire protocol for the chat relay.
//!
//! One JSON object per WebSocket text frame, tagged by a mandatory `type`
//! field. [`Inbound`] is what clients send, [`Outbound`] is what the server
//! sends. Field names on the wire are camelCase.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Frames a client may send to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Inbound {
    #[serde(rename = "chat")]
    Chat { text: String },
    #[serde(rename = "setName")]
    SetName { name: String },
    #[serde(rename = "status")]
    Status,
    #[serde(rename = "listUsers")]
    ListUsers,
    #[serde(rename = "ping")]
    Ping {
        #[serde(default)]
        token: Option<String>,
    },
    #[serde(rename = "ai")]
    Ai { prompt: String },
}

/// Frames the server may send to a client.
///
/// Timestamps (`at`) are Unix epoch milliseconds assigned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Outbound {
    #[serde(rename = "chat")]
    Chat { from: String, text: String, at: i64 },
    #[serde(rename = "system")]
    System { text: String, at: i64 },
    #[serde(rename = "ackName")]
    AckName { name: String, at: i64 },
    #[serde(rename = "status")]
    Status {
        version: String,
        #[serde(rename = "rustVersion")]
        rust_version: String,
        os: String,
        #[serde(rename = "cpuCores")]
        cpu_cores: usize,
        #[serde(rename = "uptimeSeconds")]
        uptime_seconds: u64,
        #[serde(rename = "userCount")]
        user_count: usize,
        #[serde(rename = "peakUsers")]
        peak_users: usize,
        #[serde(rename = "connectionsTotal")]
        connections_total: u64,
        #[serde(rename = "messagesSent")]
        messages_sent: u64,
        #[serde(rename = "messagesPerSecond")]
        messages_per_second: f64,
        #[serde(rename = "memoryMb")]
        memory_mb: f64,
        #[serde(rename = "aiEnabled")]
        ai_enabled: bool,
        #[serde(rename = "aiModel", skip_serializing_if = "Option::is_none", default)]
        ai_model: Option<String>,
    },
    #[serde(rename = "listUsers")]
    ListUsers { users: Vec<UserInfo> },
    #[serde(rename = "pong")]
    Pong { token: Option<String>, at: i64 },
    #[serde(rename = "ai")]
    Ai {
        from: String,
        prompt: String,
        response: String,
        #[serde(rename = "responseMs")]
        response_ms: u64,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        tokens: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        cost: Option<f64>,
        at: i64,
    },
    #[serde(rename = "error")]
    Error { message: String },
}

/// A connected user as reported by `listUsers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub ip: String,
}

/// A frame that could not be decoded.
///
/// Decode failures are never fatal to a session: the server answers with an
/// `error` frame and keeps reading.
#[derive(Debug, Error)]
#[error("message must be valid JSON with a known \"type\" field")]
pub struct DecodeError(#[from] serde_json::Error);

/// Decode one inbound text frame.
pub fn decode(text: &str) -> Result<Inbound, DecodeError> {
    Ok(serde_json::from_str(text)?)
}

/// Encode one outbound frame to its wire form.
pub fn encode(frame: &Outbound) -> String {
    serde_json::to_string(frame)
        .unwrap_or_else(|_| r#"{"type":"error","message":"serialize"}"#.into())
}

impl Outbound {
    /// Short tag for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Outbound::Chat { .. } => "chat",
            Outbound::System { .. } => "system",
            Outbound::AckName { .. } => "ackName",
            Outbound::Status { .. } => "status",
            Outbound::ListUsers { .. } => "listUsers",
            Outbound::Pong { .. } => "pong",
            Outbound::Ai { .. } => "ai",
            Outbound::Error { .. } => "error",
        }
    }
}
