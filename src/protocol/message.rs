//! Message definitions
//!
//! The request a client sends and the reply the server returns. Both share
//! the same core shape: version, command, sender and an open payload map.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Command, PROTOCOL_VERSION};

/// Open mapping carried by every message; may be empty
pub type Payload = serde_json::Map<String, Value>;

/// Command name used by error replies
pub const ERROR_COMMAND: &str = "ERROR";

/// Placeholder for a sender or command that could not be read
pub const UNKNOWN: &str = "UNKNOWN";

/// A validated inbound request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Protocol version of the sender
    pub version: String,

    /// Requested command
    #[serde(rename = "cmd")]
    pub command: Command,

    /// Opaque sender identifier
    #[serde(rename = "from")]
    pub sender: String,

    /// Command-specific data
    pub payload: Payload,

    /// Optional addressee, ignored by the server
    #[serde(rename = "to", default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl Message {
    /// Build a request stamped with the compiled protocol version
    pub fn new(command: Command, sender: impl Into<String>, payload: Payload) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            command,
            sender: sender.into(),
            payload,
            target: None,
        }
    }

    /// Override the protocol version (mainly to talk to other server builds)
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the addressee
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// A reply to send to a client
///
/// `cmd` echoes the request on success and is [`ERROR_COMMAND`] on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// Protocol version of the server
    pub version: String,

    /// Echoed command, or `ERROR`
    pub cmd: String,

    /// Server name
    pub from: String,

    /// Requester identifier
    pub to: String,

    /// Handler result; for errors `{"cmd": <requested command>}`
    pub payload: Payload,

    /// Diagnostic, `None` on success
    pub error_msg: Option<String>,

    /// Human-readable note
    pub msg: Option<String>,
}

impl Reply {
    /// Create a successful reply for `command`
    pub fn ack(server: &str, target: &str, command: Command, payload: Payload) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            cmd: command.as_str().to_string(),
            from: server.to_string(),
            to: target.to_string(),
            payload,
            error_msg: None,
            msg: Some(command.ack_message().to_string()),
        }
    }

    /// Create an error reply; `requested` is the command the client asked for
    pub fn error(server: &str, target: &str, requested: &str, message: &str) -> Self {
        let mut payload = Payload::new();
        payload.insert("cmd".to_string(), Value::String(requested.to_string()));

        Self {
            version: PROTOCOL_VERSION.to_string(),
            cmd: ERROR_COMMAND.to_string(),
            from: server.to_string(),
            to: target.to_string(),
            payload,
            error_msg: Some(message.to_string()),
            msg: None,
        }
    }

    /// Whether this is an error reply
    pub fn is_error(&self) -> bool {
        self.cmd == ERROR_COMMAND
    }

    /// Echoed command, `None` for error replies
    pub fn command(&self) -> Option<Command> {
        self.cmd.parse().ok()
    }
}
