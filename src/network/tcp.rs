//! TCP transport
//!
//! Request/reply over TCP with length-prefixed JSON frames. Any number of
//! clients may stay connected; the listener and every connection are
//! non-blocking and polled in turn, so a receive never blocks past its
//! timeout and one idle client never starves the others.

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, UdpSocket};
use std::thread;
use std::time::{Duration, Instant};

use bytes::BytesMut;

use crate::config::{parse_endpoint, ServerConfig};
use crate::error::{LhcError, Result};
use crate::protocol::codec;
use super::Transport;

/// Read chunk size per connection poll
const READ_CHUNK: usize = 4096;

/// One connected client
struct Peer {
    id: u64,
    stream: TcpStream,
    addr: SocketAddr,
    buffer: BytesMut,
}

/// Server-side TCP transport
pub struct TcpTransport {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    peers: Vec<Peer>,

    /// Connection owed a reply
    pending: Option<u64>,
    next_id: u64,
    next_poll: usize,

    idle_sleep: Duration,
    write_timeout: Duration,
    max_connections: usize,
    max_frame_size: usize,
}

impl TcpTransport {
    /// Bind the endpoint named by `config.address`
    pub fn bind(config: &ServerConfig) -> Result<Self> {
        let endpoint = parse_endpoint(&config.address)?;
        let listener = TcpListener::bind(&endpoint)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        tracing::debug!("Listening on {}", local_addr);

        Ok(Self {
            listener: Some(listener),
            local_addr,
            peers: Vec::new(),
            pending: None,
            next_id: 0,
            next_poll: 0,
            idle_sleep: Duration::from_millis(config.idle_sleep_ms.max(1)),
            write_timeout: Duration::from_millis(config.write_timeout_ms),
            max_connections: config.max_connections,
            max_frame_size: config.max_frame_size,
        })
    }

    /// Number of connected clients
    pub fn connection_count(&self) -> usize {
        self.peers.len()
    }

    /// Accept every connection waiting on the listener
    fn accept_pending(&mut self) -> Result<()> {
        let Some(listener) = self.listener.as_ref() else {
            return Err(LhcError::Transport("TCP transport is closed".to_string()));
        };

        loop {
            match listener.accept() {
                Ok((stream, addr)) => {
                    if self.peers.len() >= self.max_connections {
                        tracing::warn!(
                            "Rejecting {}: connection limit {} reached",
                            addr,
                            self.max_connections
                        );
                        continue;
                    }
                    stream.set_nonblocking(true)?;
                    // Disable Nagle's algorithm for low latency
                    stream.set_nodelay(true)?;

                    let id = self.next_id;
                    self.next_id += 1;
                    tracing::debug!("Connection established from {}", addr);
                    self.peers.push(Peer {
                        id,
                        stream,
                        addr,
                        buffer: BytesMut::with_capacity(READ_CHUNK),
                    });
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(ref e)
                    if matches!(
                        e.kind(),
                        ErrorKind::Interrupted
                            | ErrorKind::ConnectionAborted
                            | ErrorKind::ConnectionReset
                    ) =>
                {
                    continue;
                }
                Err(e) => return Err(LhcError::Io(e)),
            }
        }
    }

    /// Drain readable bytes from every connection and return the first
    /// complete frame, starting after the connection served last
    fn poll_peers(&mut self) -> Option<Vec<u8>> {
        let count = self.peers.len();
        let mut frame = None;
        let mut dead = Vec::new();

        for offset in 0..count {
            let index = (self.next_poll + offset) % count;
            let max_frame_size = self.max_frame_size;
            let peer = &mut self.peers[index];

            let open = fill_buffer(peer);

            match codec::split_frame(&mut peer.buffer, max_frame_size) {
                Ok(Some(body)) => {
                    self.pending = Some(peer.id);
                    self.next_poll = index + 1;
                    frame = Some(body.to_vec());
                    break;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Dropping client {}: {}", peer.addr, e);
                    dead.push(peer.id);
                    continue;
                }
            }

            if !open {
                tracing::debug!("Client {} disconnected", peer.addr);
                dead.push(peer.id);
            }
        }

        if !dead.is_empty() {
            self.peers.retain(|peer| !dead.contains(&peer.id));
        }
        frame
    }
}

/// Read everything currently available; returns false once the peer is gone
fn fill_buffer(peer: &mut Peer) -> bool {
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match peer.stream.read(&mut chunk) {
            Ok(0) => return false,
            Ok(n) => peer.buffer.extend_from_slice(&chunk[..n]),
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => return true,
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::debug!("Read error from {}: {}", peer.addr, e);
                return false;
            }
        }
    }
}

impl Transport for TcpTransport {
    fn recv_timeout(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>> {
        let deadline = Instant::now() + timeout;

        loop {
            self.accept_pending()?;

            if let Some(frame) = self.poll_peers() {
                return Ok(Some(frame));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            thread::sleep(self.idle_sleep.min(deadline - now));
        }
    }

    fn send(&mut self, body: &[u8]) -> Result<()> {
        let Some(id) = self.pending.take() else {
            return Err(LhcError::Transport("no request awaiting a reply".to_string()));
        };
        let Some(index) = self.peers.iter().position(|peer| peer.id == id) else {
            tracing::debug!("Requester left before its reply was sent");
            return Ok(());
        };

        let frame = codec::frame(body)?;
        let write_timeout = self.write_timeout;
        let peer = &mut self.peers[index];

        let written = (|| -> std::io::Result<()> {
            peer.stream.set_nonblocking(false)?;
            if !write_timeout.is_zero() {
                peer.stream.set_write_timeout(Some(write_timeout))?;
            }
            peer.stream.write_all(&frame)?;
            peer.stream.flush()?;
            peer.stream.set_nonblocking(true)
        })();

        if let Err(e) = written {
            // Requester gone; the loop carries on with the others
            tracing::debug!("Client {} disconnected before its reply: {}", peer.addr, e);
            self.peers.remove(index);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.peers.clear();
        self.pending = None;
        self.listener = None;
        tracing::debug!("Closed endpoint {}", self.local_addr);
        Ok(())
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        Some(self.local_addr)
    }
}

/// IPv4 address of this host as seen by other machines
///
/// Connecting a UDP socket sends no traffic; it only selects the outbound
/// interface. Falls back to loopback on hosts without a route.
pub fn local_ip() -> std::net::IpAddr {
    let probe = || -> std::io::Result<std::net::IpAddr> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect("8.8.8.8:80")?;
        Ok(socket.local_addr()?.ip())
    };
    probe().unwrap_or(std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST))
}
