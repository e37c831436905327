//! # LHC Server
//!
//! A command-and-control server for laboratory device endpoints (motor
//! controllers, cameras) with:
//! - A versioned JSON request/reply protocol
//! - A closed command vocabulary (INFO, PING, GET, SET, SAVE, OPT, STOP)
//! - Host callbacks per command, without depending on any host type
//! - A background receive loop that never blocks the host thread
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Transport (TCP / channel)                  │
//! │                    (Multiple Clients)                        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ frames
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                Receive Loop (one thread)                     │
//! │          decode ─► validate ─► dispatch ─► reply             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Registry   │          │ ServerState │◄──── host: set_data
//!   │ (callbacks) │◄───┐     │  (RwLock)   │
//!   └─────────────┘    │     └─────────────┘
//!                      └──── host: register_callback
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use lhc_server::{DeviceKind, Payload, Server, ServerConfig};
//!
//! let config = ServerConfig::builder()
//!     .name("stage")
//!     .address("tcp://*:5555")
//!     .freedom(2)
//!     .device(DeviceKind::Motor)
//!     .build();
//!
//! let server = Server::new(config)?;
//! server.set_on_set(|payload| {
//!     println!("positions: {:?}", payload.get("positions"));
//!     Ok(Payload::new())
//! });
//! server.start()?;
//! // ... host application runs here ...
//! server.stop()?;
//! # Ok::<(), lhc_server::LhcError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod device;

pub mod protocol;
pub mod dispatch;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{HandlerError, LhcError, Result};
pub use config::ServerConfig;
pub use device::{DeviceIdentity, DeviceKind};
pub use protocol::{Command, Message, Payload, Reply, PROTOCOL_VERSION};
pub use dispatch::Dispatcher;
pub use network::{Client, Server, ServerStatus, Transport};

// =============================================================================
// Version Info
// =============================================================================

/// Current release version of this crate (not the protocol version)
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
