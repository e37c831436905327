//! Server lifecycle
//!
//! Owns the receive-loop thread and the transport.
//!
//! ```text
//! Created ──start()──► Running ──stop() / wire STOP──► Stopping ──► Stopped
//!    └──────────────────────stop()──────────────────────────────────────┘
//! ```
//! A server is single-use: once it leaves `Running` it cannot be started again.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::ServerConfig;
use crate::device::DeviceIdentity;
use crate::dispatch::Dispatcher;
use crate::error::{HandlerError, LhcError, Result};
use crate::protocol::{Command, Payload};
use super::tcp::{local_ip, TcpTransport};
use super::Transport;

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Created,
    Running,
    Stopping,
    Stopped,
}

/// State shared with the receive-loop thread
struct Shared {
    dispatcher: Dispatcher,
    status: Mutex<ServerStatus>,
    poll_interval: Duration,
}

/// Command-and-control server for one device
///
/// ## Threading
/// - `start()` spawns one named thread running the receive loop and returns
///   immediately; the host keeps its own thread (e.g. a GUI event loop).
/// - `set_data`, `register_callback` and `stop` may be called from any thread
///   at any time.
/// - Callbacks run on the receive-loop thread, one request at a time.
/// - Dropping a running server stops it and joins the thread.
pub struct Server {
    config: ServerConfig,
    shared: Arc<Shared>,

    /// Transport supplied up front; `None` means bind TCP on start
    transport: Mutex<Option<Box<dyn Transport>>>,

    /// Held for the whole join so concurrent `stop()` calls all wait
    worker: Mutex<Option<JoinHandle<Result<()>>>>,

    local_addr: Mutex<Option<SocketAddr>>,
}

impl Server {
    /// Create a server that binds `config.address` over TCP on start
    pub fn new(config: ServerConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// Create a server on a caller-supplied transport
    pub fn with_transport<T>(config: ServerConfig, transport: T) -> Result<Self>
    where
        T: Transport + 'static,
    {
        Self::build(config, Some(Box::new(transport)))
    }

    fn build(config: ServerConfig, transport: Option<Box<dyn Transport>>) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(Shared {
            dispatcher: Dispatcher::from_config(&config),
            status: Mutex::new(ServerStatus::Created),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        });

        tracing::debug!(
            "[Server {}] Created ({} device, freedom {}).",
            config.name,
            config.device,
            config.freedom
        );

        Ok(Self {
            config,
            shared,
            transport: Mutex::new(transport),
            worker: Mutex::new(None),
            local_addr: Mutex::new(None),
        })
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Bind the transport and launch the receive loop
    ///
    /// No-op while running; fails once the server has been stopped.
    pub fn start(&self) -> Result<()> {
        let mut status = self.shared.status.lock();
        match *status {
            ServerStatus::Running => return Ok(()),
            ServerStatus::Stopping | ServerStatus::Stopped => {
                return Err(LhcError::Lifecycle(format!(
                    "server '{}' was stopped and cannot be restarted",
                    self.config.name
                )))
            }
            ServerStatus::Created => {}
        }

        let transport = match self.transport.lock().take() {
            Some(transport) => transport,
            None => Box::new(TcpTransport::bind(&self.config)?),
        };
        *self.local_addr.lock() = transport.local_addr();

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name(format!("lhc-server-{}", self.config.name))
            .spawn(move || receive_loop(&shared, transport))?;

        *self.worker.lock() = Some(handle);
        *status = ServerStatus::Running;

        tracing::info!("[Server {}] Running on: {}", self.config.name, self.config.address);
        if let Some(address) = self.address_for_client() {
            tracing::info!("[Server {}] To connect with, use: {}", self.config.name, address);
        }
        Ok(())
    }

    /// Stop the receive loop and wait for the thread to finish
    ///
    /// Safe to call repeatedly. Returns the loop's transport failure, if any,
    /// to the first caller that joins the thread.
    pub fn stop(&self) -> Result<()> {
        {
            let mut status = self.shared.status.lock();
            match *status {
                ServerStatus::Created => {
                    *status = ServerStatus::Stopped;
                    self.transport.lock().take();
                    return Ok(());
                }
                ServerStatus::Running => {
                    tracing::info!("[Server {}] Stopping...", self.config.name);
                    *status = ServerStatus::Stopping;
                }
                ServerStatus::Stopping | ServerStatus::Stopped => {}
            }
        }

        self.shared.dispatcher.shutdown_signal().trigger();
        self.join_worker()
    }

    /// Block until the receive loop ends on its own (e.g. after a wire STOP)
    ///
    /// Returns immediately if the loop was never started.
    pub fn wait(&self) -> Result<()> {
        self.join_worker()
    }

    fn join_worker(&self) -> Result<()> {
        let mut worker = self.worker.lock();
        let Some(handle) = worker.take() else {
            return Ok(());
        };

        let outcome = handle
            .join()
            .map_err(|_| LhcError::Lifecycle("receive loop panicked".to_string()))
            .and_then(|outcome| outcome);

        *self.shared.status.lock() = ServerStatus::Stopped;
        outcome
    }

    pub fn status(&self) -> ServerStatus {
        *self.shared.status.lock()
    }

    pub fn is_running(&self) -> bool {
        self.status() == ServerStatus::Running
    }

    // =========================================================================
    // Data and Callbacks
    // =========================================================================

    /// Replace the data snapshot served by GET
    pub fn set_data(&self, data: Payload) {
        self.shared.dispatcher.set_data(data);
    }

    /// Copy of the current data snapshot
    pub fn data(&self) -> Payload {
        self.shared.dispatcher.data()
    }

    /// Reset the data snapshot
    pub fn empty_data(&self) {
        self.shared.dispatcher.empty_data();
    }

    /// Register a callback for `command`, replacing any earlier one
    pub fn register_callback<F>(&self, command: Command, callback: F)
    where
        F: Fn(&Payload) -> std::result::Result<Payload, HandlerError> + Send + Sync + 'static,
    {
        self.shared.dispatcher.register_callback(command, callback);
    }

    /// Remove the callback for `command`
    pub fn clear_callback(&self, command: Command) -> bool {
        self.shared.dispatcher.clear_callback(command)
    }

    /// Callback notified on every GET; the reply is still the data snapshot
    pub fn set_on_get<F>(&self, callback: F)
    where
        F: Fn(&Payload) -> std::result::Result<Payload, HandlerError> + Send + Sync + 'static,
    {
        self.register_callback(Command::Get, callback);
    }

    /// Callback invoked when positions arrive with SET
    pub fn set_on_set<F>(&self, callback: F)
    where
        F: Fn(&Payload) -> std::result::Result<Payload, HandlerError> + Send + Sync + 'static,
    {
        self.register_callback(Command::Set, callback);
    }

    /// Callback invoked when a saving path arrives with SAVE
    pub fn set_on_save<F>(&self, callback: F)
    where
        F: Fn(&Payload) -> std::result::Result<Payload, HandlerError> + Send + Sync + 'static,
    {
        self.register_callback(Command::Save, callback);
    }

    /// Callback invoked when options arrive with OPT
    pub fn set_on_opt<F>(&self, callback: F)
    where
        F: Fn(&Payload) -> std::result::Result<Payload, HandlerError> + Send + Sync + 'static,
    {
        self.register_callback(Command::Opt, callback);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn identity(&self) -> &DeviceIdentity {
        self.shared.dispatcher.identity()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bound socket address, known once started on a socket transport
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    /// Address a remote client should use, `tcp://<host ip>:<port>`
    pub fn address_for_client(&self) -> Option<String> {
        let addr = self.local_addr()?;
        let ip = if addr.ip().is_unspecified() {
            local_ip()
        } else {
            addr.ip()
        };
        Some(format!("tcp://{}", SocketAddr::new(ip, addr.port())))
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!("[Server {}] Error during shutdown: {}", self.config.name, e);
        }
    }
}

// =============================================================================
// Receive Loop
// =============================================================================

/// Thread body: run the loop, then release the transport
fn receive_loop(shared: &Shared, mut transport: Box<dyn Transport>) -> Result<()> {
    let name = shared.dispatcher.name().to_string();

    let outcome = serve(shared, transport.as_mut());

    tracing::debug!("[Server {}] Closing transport...", name);
    if let Err(e) = transport.close() {
        tracing::warn!("[Server {}] Error closing transport: {}", name, e);
    }
    drop(transport);

    *shared.status.lock() = ServerStatus::Stopped;
    match &outcome {
        Ok(()) => tracing::info!("[Server {}] Stopped.", name),
        Err(e) => tracing::error!("[Server {}] Stopped on transport failure: {}", name, e),
    }
    outcome
}

/// Receive, dispatch, reply until stopped
///
/// Only transport failures escape; every other failure is already an error
/// reply inside the dispatch.
fn serve(shared: &Shared, transport: &mut dyn Transport) -> Result<()> {
    let signal = shared.dispatcher.shutdown_signal();

    while !signal.is_triggered() {
        let Some(request) = transport.recv_timeout(shared.poll_interval)? else {
            continue;
        };

        let dispatch = shared.dispatcher.process(&request);
        if dispatch.stop {
            *shared.status.lock() = ServerStatus::Stopping;
        }

        transport.send(&dispatch.bytes)?;

        if dispatch.stop {
            break;
        }
    }
    Ok(())
}
