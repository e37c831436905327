//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Message Format (JSON)
//!
//! ### Request
//! ```text
//! {"version": "0.1.6", "cmd": "GET", "from": "client_1", "payload": {}}
//! ```
//!
//! ### Reply
//! ```text
//! {"version": "0.1.6", "cmd": "GET", "from": "<server>", "to": "client_1",
//!  "payload": {...}, "error_msg": null, "msg": "Data transmitted."}
//! ```
//!
//! Error replies use `"cmd": "ERROR"`, a non-null `error_msg`, and carry the
//! requested command in `payload.cmd`.
//!
//! ### Commands
//! - INFO:  device identity and capabilities
//! - PING:  liveness check
//! - GET:   current data snapshot
//! - SET:   payload `positions`
//! - SAVE:  payload `path`
//! - OPT:   payload `data`
//! - STOP:  shut the server down

mod command;
mod message;
pub mod codec;
pub mod validate;

pub use command::{Command, UnknownCommand};
pub use message::{Message, Payload, Reply, ERROR_COMMAND, UNKNOWN};
pub use codec::{decode, decode_reply, encode, encode_message, DecodeError};
pub use validate::{validate, ValidationError, ValidationResult};

/// Protocol version compiled into this build
///
/// Compared for exact equality with every inbound message. Unrelated to the
/// crate version.
pub const PROTOCOL_VERSION: &str = "0.1.6";
