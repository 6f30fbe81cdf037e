//! Provider protocol types.
//!
//! Defines the JSON protocol used for communication between calsh
//! and provider binaries over stdin/stdout.

use serde::{Deserialize, Serialize};

/// Commands that providers must implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Authenticate,
    ListEvents,
    CreateEvent,
    DeleteEvent,
}

/// Request sent from calsh to a provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent from a provider to calsh.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

const UNSERIALIZABLE: &str = r#"{"status":"error","error":"Failed to serialize response"}"#;

impl<T: Serialize> Response<T> {
    pub fn success(data: T) -> String {
        serde_json::to_string(&Response::Success { data }).unwrap_or_else(|_| UNSERIALIZABLE.to_string())
    }
}

impl Response<()> {
    pub fn error(msg: &str) -> String {
        serde_json::to_string(&Response::<()>::Error {
            error: msg.to_string(),
        })
        .unwrap_or_else(|_| UNSERIALIZABLE.to_string())
    }
}
