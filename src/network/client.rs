//! Blocking client
//!
//! Sends one request at a time over TCP and waits for its reply.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::time::Duration;

use serde_json::Value;

use crate::config::{parse_endpoint, ADDRESS_SCHEME};
use crate::error::Result;
use crate::protocol::{codec, Command, Message, Payload, Reply};

/// Default reply timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Request/reply client for an LHC server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    sender: String,
    max_frame_size: usize,
}

impl Client {
    /// Connect to `address` (`tcp://host:port` or `host:port`) as `sender`
    pub fn connect(address: &str, sender: impl Into<String>) -> Result<Self> {
        let endpoint = if address.starts_with(ADDRESS_SCHEME) {
            parse_endpoint(address)?
        } else {
            address.to_string()
        };

        let stream = TcpStream::connect(&endpoint)?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(DEFAULT_TIMEOUT))?;
        stream.set_write_timeout(Some(DEFAULT_TIMEOUT))?;

        let read_stream = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            sender: sender.into(),
            max_frame_size: codec::MAX_FRAME_SIZE,
        })
    }

    /// Set the reply timeout; `None` waits forever
    pub fn set_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.reader.get_ref().set_read_timeout(timeout)?;
        self.writer.get_ref().set_write_timeout(timeout)?;
        Ok(())
    }

    /// Identifier sent as `from`
    pub fn sender(&self) -> &str {
        &self.sender
    }

    // =========================================================================
    // Raw Exchange
    // =========================================================================

    /// Send arbitrary bytes as one frame and decode the reply
    pub fn send_raw(&mut self, body: &[u8]) -> Result<Reply> {
        codec::write_frame(&mut self.writer, body)?;
        let reply = codec::read_frame(&mut self.reader, self.max_frame_size)?;
        codec::decode_reply(&reply)
    }

    /// Send a prepared message
    pub fn send_message(&mut self, message: &Message) -> Result<Reply> {
        tracing::trace!("Sending {} as '{}'", message.command, message.sender);
        self.send_raw(&codec::encode_message(message)?)
    }

    /// Send `command` with `payload`, stamped with this client's identity
    pub fn request(&mut self, command: Command, payload: Payload) -> Result<Reply> {
        let message = Message::new(command, self.sender.clone(), payload);
        self.send_message(&message)
    }

    // =========================================================================
    // Commands
    // =========================================================================

    pub fn info(&mut self) -> Result<Reply> {
        self.request(Command::Info, Payload::new())
    }

    pub fn ping(&mut self) -> Result<Reply> {
        self.request(Command::Ping, Payload::new())
    }

    pub fn get(&mut self) -> Result<Reply> {
        self.request(Command::Get, Payload::new())
    }

    /// SET with `{"positions": positions}`
    pub fn set_positions(&mut self, positions: Value) -> Result<Reply> {
        self.request(Command::Set, single("positions", positions))
    }

    /// SAVE with `{"path": path}`
    pub fn save(&mut self, path: &str) -> Result<Reply> {
        self.request(Command::Save, single("path", Value::from(path)))
    }

    /// OPT with `{"data": data}`
    pub fn opt(&mut self, data: Value) -> Result<Reply> {
        self.request(Command::Opt, single("data", data))
    }

    pub fn stop(&mut self) -> Result<Reply> {
        self.request(Command::Stop, Payload::new())
    }
}

fn single(key: &str, value: Value) -> Payload {
    let mut payload = Payload::new();
    payload.insert(key.to_string(), value);
    payload
}
