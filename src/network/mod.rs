//! Network Module
//!
//! Transports, the blocking client, and the server lifecycle.
//!
//! ## Architecture
//! - One background thread runs the receive loop
//! - Requests are handled strictly in arrival order, one at a time
//! - Replies go back to the connection the request came from
//! - Transports are pluggable through [`Transport`]

mod channel;
mod client;
mod server;
mod tcp;

pub use channel::{ChannelClient, ChannelTransport};
pub use client::Client;
pub use server::{Server, ServerStatus};
pub use tcp::{local_ip, TcpTransport};

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::Result;

/// Request/reply duplex transport driven by the receive loop
///
/// Binding happens in the implementor's constructor. The loop alternates
/// strictly: every frame returned by `recv_timeout` is answered by exactly one
/// `send` before the next receive.
pub trait Transport: Send {
    /// Wait up to `timeout` for the next request body
    ///
    /// `Ok(None)` means nothing arrived in time. `Err` is an unrecoverable
    /// transport failure and ends the receive loop.
    fn recv_timeout(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>>;

    /// Send the reply to the most recent request
    fn send(&mut self, body: &[u8]) -> Result<()>;

    /// Release the endpoint
    fn close(&mut self) -> Result<()>;

    /// Bound socket address, if the transport has one
    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }
}
