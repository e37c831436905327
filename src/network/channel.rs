//! In-process transport
//!
//! A crossbeam channel pair standing in for a socket. Lets a host embed the
//! server without networking, and makes lifecycle tests deterministic.

use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use crate::error::{LhcError, Result};
use crate::protocol::{codec, Message, Reply};
use super::Transport;

/// Server side of the pair
pub struct ChannelTransport {
    requests: Receiver<Vec<u8>>,
    replies: Sender<Vec<u8>>,
    closed: bool,
}

/// Client side of the pair
pub struct ChannelClient {
    requests: Sender<Vec<u8>>,
    replies: Receiver<Vec<u8>>,
}

impl ChannelTransport {
    /// Create a connected transport/client pair
    pub fn pair() -> (ChannelTransport, ChannelClient) {
        let (request_tx, request_rx) = channel::unbounded();
        let (reply_tx, reply_rx) = channel::unbounded();

        let transport = ChannelTransport {
            requests: request_rx,
            replies: reply_tx,
            closed: false,
        };
        let client = ChannelClient {
            requests: request_tx,
            replies: reply_rx,
        };
        (transport, client)
    }
}

impl Transport for ChannelTransport {
    fn recv_timeout(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>> {
        if self.closed {
            return Err(LhcError::Transport("channel transport is closed".to_string()));
        }
        match self.requests.recv_timeout(timeout) {
            Ok(body) => Ok(Some(body)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(LhcError::Transport(
                "client side of the channel disconnected".to_string(),
            )),
        }
    }

    fn send(&mut self, body: &[u8]) -> Result<()> {
        self.replies
            .send(body.to_vec())
            .map_err(|_| LhcError::Transport("client side of the channel disconnected".to_string()))
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

impl ChannelClient {
    /// Queue raw request bytes
    pub fn send(&self, body: impl Into<Vec<u8>>) -> Result<()> {
        self.requests
            .send(body.into())
            .map_err(|_| LhcError::Transport("server side of the channel is gone".to_string()))
    }

    /// Wait up to `timeout` for the next reply body
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Vec<u8>>> {
        match self.replies.recv_timeout(timeout) {
            Ok(body) => Ok(Some(body)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(LhcError::Transport(
                "server side of the channel is gone".to_string(),
            )),
        }
    }

    /// Send raw bytes and decode the reply
    pub fn request_raw(&self, body: impl Into<Vec<u8>>, timeout: Duration) -> Result<Reply> {
        self.send(body)?;
        match self.recv_timeout(timeout)? {
            Some(bytes) => codec::decode_reply(&bytes),
            None => Err(LhcError::Transport(format!(
                "no reply within {} ms",
                timeout.as_millis()
            ))),
        }
    }

    /// Send a request and decode the reply
    pub fn request(&self, message: &Message, timeout: Duration) -> Result<Reply> {
        self.request_raw(codec::encode_message(message)?, timeout)
    }
}
