//! Dispatch Module
//!
//! Routes validated messages to handlers and turns their outcome into replies.
//!
//! ## Pipeline
//! ```text
//! bytes ──► codec::decode ──► validate ──► registry.resolve ──► handler
//!   │            │               │                                 │
//!   │        DecodeError    ValidationError                  HandlerError
//!   │            └───────────────┴──────────► error reply ◄────────┘
//!   ▼
//! reply bytes
//! ```
//! Every client-triggerable failure becomes an error reply; nothing on this
//! path returns an error to the receive loop.

mod handlers;
mod registry;
mod state;

pub use handlers::{require_keys, HandlerContext};
pub use registry::{BuiltinHandler, Callback, CommandRegistry, Handler};
pub use state::ServerState;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::config::ServerConfig;
use crate::device::DeviceIdentity;
use crate::error::HandlerError;
use crate::protocol::{
    codec, validate, Command, Message, Payload, Reply, ValidationResult, PROTOCOL_VERSION,
    UNKNOWN,
};

/// Stop flag shared by the dispatcher, the receive loop and the host
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Result of processing one inbound frame
#[derive(Debug, Clone)]
pub struct Dispatch {
    /// Reply to send back
    pub reply: Reply,

    /// Encoded reply
    pub bytes: Vec<u8>,

    /// The request was a valid STOP
    pub stop: bool,
}

/// Owns the server state and routes messages to handlers
pub struct Dispatcher {
    state: ServerState,
    registry: CommandRegistry,
    shutdown: ShutdownSignal,
    expected_version: String,
}

impl Dispatcher {
    /// Create a dispatcher expecting the compiled protocol version
    pub fn new(identity: DeviceIdentity, data: Payload, empty_data_after_get: bool) -> Self {
        Self {
            state: ServerState::new(identity, data, empty_data_after_get),
            registry: CommandRegistry::new(),
            shutdown: ShutdownSignal::new(),
            expected_version: PROTOCOL_VERSION.to_string(),
        }
    }

    /// Create a dispatcher from a server configuration
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.identity(),
            config.initial_data.clone(),
            config.empty_data_after_get,
        )
    }

    /// Expect a different protocol version
    pub fn with_expected_version(mut self, version: impl Into<String>) -> Self {
        self.expected_version = version.into();
        self
    }

    // =========================================================================
    // Request Path
    // =========================================================================

    /// Decode, validate and handle one inbound frame
    pub fn process(&self, bytes: &[u8]) -> Dispatch {
        let name = self.name();

        let (reply, stop) = match codec::decode(bytes) {
            Err(e) => {
                tracing::warn!("[Server {}] Undecodable message: {}", name, e);
                (Reply::error(name, UNKNOWN, UNKNOWN, &e.to_string()), false)
            }
            Ok(value) => match validate(&value, &self.expected_version) {
                ValidationResult::Invalid(e) => {
                    let target = string_or_unknown(&value, "from");
                    let cmd = string_or_unknown(&value, "cmd");
                    tracing::warn!("[Server {}] Malformed message from {}: {}", name, target, e);
                    (Reply::error(name, target, cmd, &e.to_string()), false)
                }
                ValidationResult::Valid(message) => {
                    let stop = message.command == Command::Stop;
                    (self.handle(&message), stop)
                }
            },
        };

        let bytes = self.encode_reply(&reply);
        Dispatch { reply, bytes, stop }
    }

    /// Handle an already validated message
    pub fn handle(&self, message: &Message) -> Reply {
        let name = self.name();
        let command = message.command;

        match command {
            Command::Ping | Command::Get => tracing::debug!(
                "[Server {}] Received: '{}' from '{}'.",
                name,
                command,
                message.sender
            ),
            _ => tracing::info!(
                "[Server {}] Received: '{}' from '{}'.",
                name,
                command,
                message.sender
            ),
        }

        let outcome = match self.registry.resolve(command) {
            Handler::Builtin(handler) => {
                let ctx = HandlerContext {
                    state: &self.state,
                    registry: &self.registry,
                    shutdown: &self.shutdown,
                };
                handler(&ctx, message)
            }
            // GET always serves the snapshot; its callback is a notification
            Handler::Callback(callback) if command == Command::Get => {
                tracing::debug!("[Server {}] Callback for '{}' notified.", name, command);
                invoke_callback(&callback, &message.payload).map(|_| self.state.data_for_get())
            }
            Handler::Callback(callback) => {
                tracing::debug!("[Server {}] Callback for '{}' used.", name, command);
                invoke_callback(&callback, &message.payload)
            }
        };

        // STOP shuts the server down even when a callback replaced the handler
        if command == Command::Stop {
            self.shutdown.trigger();
        }

        match outcome {
            Ok(payload) => Reply::ack(name, &message.sender, command, payload),
            Err(e) => {
                tracing::error!("[Server {}] Handler for '{}' failed: {}", name, command, e);
                Reply::error(name, &message.sender, command.as_str(), &e.to_string())
            }
        }
    }

    fn encode_reply(&self, reply: &Reply) -> Vec<u8> {
        match codec::encode(reply) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("[Server {}] Reply could not be encoded: {}", self.name(), e);
                let fallback = Reply::error(self.name(), &reply.to, &reply.cmd, &e.to_string());
                codec::encode(&fallback).unwrap_or_default()
            }
        }
    }

    // =========================================================================
    // Host Interface
    // =========================================================================

    /// Replace the data snapshot served by GET
    pub fn set_data(&self, data: Payload) {
        self.state.set_data(data);
    }

    /// Copy of the current data snapshot
    pub fn data(&self) -> Payload {
        self.state.data()
    }

    /// Reset the data snapshot
    pub fn empty_data(&self) {
        self.state.empty_data();
    }

    /// Register a host callback for `command`
    pub fn register_callback<F>(&self, command: Command, callback: F)
    where
        F: Fn(&Payload) -> Result<Payload, HandlerError> + Send + Sync + 'static,
    {
        self.registry.register_callback(command, callback);
    }

    /// Remove the host callback for `command`
    pub fn clear_callback(&self, command: Command) -> bool {
        self.registry.clear_callback(command)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.state.identity().name
    }

    pub fn identity(&self) -> &DeviceIdentity {
        self.state.identity()
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    pub fn expected_version(&self) -> &str {
        &self.expected_version
    }
}

/// Run a host callback, turning a panic into a handler error
fn invoke_callback(callback: &Callback, payload: &Payload) -> Result<Payload, HandlerError> {
    match panic::catch_unwind(AssertUnwindSafe(|| (**callback)(payload))) {
        Ok(outcome) => outcome,
        Err(panic) => Err(HandlerError::Panicked(panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn string_or_unknown<'a>(value: &'a Value, field: &str) -> &'a str {
    value.get(field).and_then(Value::as_str).unwrap_or(UNKNOWN)
}
