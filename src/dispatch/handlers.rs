//! Built-in command handlers
//!
//! Defaults used when no host callback is registered for a command.

use serde_json::Value;

use crate::error::HandlerError;
use crate::protocol::{Command, Message, Payload};
use super::registry::{BuiltinHandler, CommandRegistry};
use super::state::ServerState;
use super::ShutdownSignal;

/// What a built-in handler may touch
pub struct HandlerContext<'a> {
    pub state: &'a ServerState,
    pub registry: &'a CommandRegistry,
    pub shutdown: &'a ShutdownSignal,
}

/// Built-in handler for `command`
pub fn builtin(command: Command) -> BuiltinHandler {
    match command {
        Command::Info => handle_info,
        Command::Ping => handle_ping,
        Command::Get => handle_get,
        Command::Set => handle_set,
        Command::Save => handle_save,
        Command::Opt => handle_opt,
        Command::Stop => handle_stop,
    }
}

fn handle_info(ctx: &HandlerContext<'_>, _message: &Message) -> Result<Payload, HandlerError> {
    let identity = ctx.state.identity();
    let capabilities = Command::ALL
        .iter()
        .map(|c| Value::from(c.as_str()))
        .collect::<Vec<_>>();
    let callbacks = ctx
        .registry
        .registered()
        .iter()
        .map(|c| Value::from(c.as_str()))
        .collect::<Vec<_>>();

    let mut payload = Payload::new();
    payload.insert("name".to_string(), Value::from(identity.name.as_str()));
    payload.insert("address".to_string(), Value::from(identity.address.as_str()));
    payload.insert("device".to_string(), Value::from(identity.device.as_str()));
    payload.insert("freedom".to_string(), Value::from(identity.freedom));
    payload.insert("capabilities".to_string(), Value::Array(capabilities));
    payload.insert("callbacks".to_string(), Value::Array(callbacks));
    Ok(payload)
}

fn handle_ping(_ctx: &HandlerContext<'_>, _message: &Message) -> Result<Payload, HandlerError> {
    Ok(Payload::new())
}

fn handle_get(ctx: &HandlerContext<'_>, _message: &Message) -> Result<Payload, HandlerError> {
    Ok(ctx.state.data_for_get())
}

// SET, SAVE and OPT carry device-specific semantics; without a callback the
// server only checks the payload and acknowledges.

fn handle_set(_ctx: &HandlerContext<'_>, message: &Message) -> Result<Payload, HandlerError> {
    require_keys(&message.payload, &["positions"])?;
    Ok(Payload::new())
}

fn handle_save(_ctx: &HandlerContext<'_>, message: &Message) -> Result<Payload, HandlerError> {
    require_keys(&message.payload, &["path"])?;
    Ok(Payload::new())
}

fn handle_opt(_ctx: &HandlerContext<'_>, message: &Message) -> Result<Payload, HandlerError> {
    require_keys(&message.payload, &["data"])?;
    Ok(Payload::new())
}

fn handle_stop(ctx: &HandlerContext<'_>, _message: &Message) -> Result<Payload, HandlerError> {
    ctx.shutdown.trigger();
    Ok(Payload::new())
}

/// Fail with the list of `keys` absent from `payload`
pub fn require_keys(payload: &Payload, keys: &[&str]) -> Result<(), HandlerError> {
    let missing: Vec<&str> = keys
        .iter()
        .copied()
        .filter(|key| !payload.contains_key(*key))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(HandlerError::MissingKey(format!("{:?}", missing)))
    }
}
