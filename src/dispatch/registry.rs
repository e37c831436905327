//! Command registry
//!
//! Fixed mapping from command to handler. Every command has a built-in
//! handler; each command additionally has one callback slot the host can fill
//! at any time. A filled slot takes precedence over the built-in, except for
//! GET where the callback is only notified.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::HandlerError;
use crate::protocol::{Command, Message, Payload};
use super::handlers::{self, HandlerContext};

/// Host-supplied handler: receives the request payload, returns the reply payload
///
/// Runs synchronously on the receive loop thread; a slow callback stalls the
/// whole protocol, so long work must be handed off and the callback return
/// promptly.
pub type Callback = Arc<dyn Fn(&Payload) -> Result<Payload, HandlerError> + Send + Sync>;

/// Built-in handler signature
pub type BuiltinHandler = fn(&HandlerContext<'_>, &Message) -> Result<Payload, HandlerError>;

/// Handler resolved for one dispatch
#[derive(Clone)]
pub enum Handler {
    Builtin(BuiltinHandler),
    Callback(Callback),
}

/// Command to handler mapping
pub struct CommandRegistry {
    callbacks: RwLock<HashMap<Command, Callback>>,
}

impl CommandRegistry {
    /// Build the registry with every callback slot empty
    pub fn new() -> Self {
        Self {
            callbacks: RwLock::new(HashMap::new()),
        }
    }

    /// Fill the callback slot of `command`; the latest registration wins
    pub fn register_callback<F>(&self, command: Command, callback: F)
    where
        F: Fn(&Payload) -> Result<Payload, HandlerError> + Send + Sync + 'static,
    {
        let previous = self.callbacks.write().insert(command, Arc::new(callback));
        if previous.is_some() {
            tracing::debug!("Callback for '{}' replaced.", command);
        } else {
            tracing::debug!("Callback for '{}' set.", command);
        }
    }

    /// Empty the callback slot of `command`, restoring the built-in
    pub fn clear_callback(&self, command: Command) -> bool {
        self.callbacks.write().remove(&command).is_some()
    }

    /// Handler to use for `command` right now
    ///
    /// The callback is cloned out of the slot, so a registration racing with a
    /// dispatch affects the next dispatch, never the one in flight.
    pub fn resolve(&self, command: Command) -> Handler {
        if let Some(callback) = self.callbacks.read().get(&command) {
            return Handler::Callback(Arc::clone(callback));
        }
        Handler::Builtin(handlers::builtin(command))
    }

    /// Commands that currently have a callback, in canonical order
    pub fn registered(&self) -> Vec<Command> {
        let callbacks = self.callbacks.read();
        Command::ALL
            .into_iter()
            .filter(|command| callbacks.contains_key(command))
            .collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
