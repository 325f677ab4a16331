//! Daemon protocol types for NDJSON communication over UNIX socket.
//!
//! CHANGELOG:
//! - 10/16/2026 - Error codes for gateway failures, optional params
//! - 10/15/2026 - Initial implementation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Current protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// NDJSON request from client to daemon.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    /// Unique request ID (UUID)
    pub id: String,
    /// Protocol version (currently 1)
    pub v: u8,
    /// Method name (e.g., "health", "get_unread_messages", "send_message")
    pub method: String,
    /// Method parameters; missing means none
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
}

/// NDJSON response from daemon to client.
#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    /// Request ID (matches request)
    pub id: String,
    /// False when the method failed; `error` is then set
    pub ok: bool,
    /// Normalized records, id lists, or a send flag
    pub result: Option<serde_json::Value>,
    pub error: Option<ErrorInfo>,
    pub meta: ResponseMeta,
}

/// Error details in response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// "NOT_FOUND", "UNKNOWN_METHOD", "INVALID_PARAMS", "INVALID_JSON" or "ERROR"
    pub code: String,
    /// Human-readable message, e.g. "Group metadata not found: g1@g.us"
    pub message: String,
    /// Always null from this daemon
    pub details: Option<serde_json::Value>,
}

/// Response metadata.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Server execution time in milliseconds
    pub server_ms: f64,
    /// Echoes `PROTOCOL_VERSION`
    pub protocol_v: u8,
}

impl Request {
    /// Build a request with a fresh UUID.
    pub fn new(method: impl Into<String>, params: HashMap<String, serde_json::Value>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            v: PROTOCOL_VERSION,
            method: method.into(),
            params,
        }
    }

    /// Parse request from NDJSON line.
    pub fn from_ndjson_line(line: &str) -> Result<Self> {
        serde_json::from_str(line.trim()).context("Failed to parse request JSON")
    }

    pub fn to_ndjson_line(&self) -> Result<String> {
        Ok(format!("{}\n", serde_json::to_string(self)?))
    }
}

impl Response {
    /// Create a success response.
    pub fn success(id: String, result: serde_json::Value, server_ms: f64) -> Self {
        Self {
            id,
            ok: true,
            result: Some(result),
            error: None,
            meta: ResponseMeta {
                server_ms,
                protocol_v: PROTOCOL_VERSION,
            },
        }
    }

    /// Create an error response with one of the `ErrorInfo` codes.
    pub fn error(id: String, code: &str, message: String, server_ms: f64) -> Self {
        Self {
            id,
            ok: false,
            result: None,
            error: Some(ErrorInfo {
                code: code.to_string(),
                message,
                details: None,
            }),
            meta: ResponseMeta {
                server_ms,
                protocol_v: PROTOCOL_VERSION,
            },
        }
    }

    /// Serialize response to NDJSON line.
    pub fn to_ndjson_line(&self) -> Result<String> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}
