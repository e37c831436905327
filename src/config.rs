//! Configuration for the LHC server
//!
//! Centralized configuration with sensible defaults.

use crate::device::{DeviceIdentity, DeviceKind};
use crate::error::{LhcError, Result};
use crate::protocol::Payload;

/// Scheme every server address must use
pub const ADDRESS_SCHEME: &str = "tcp://";

/// Main configuration for a server instance
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // -------------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------------
    /// Server name, echoed as `from` in every reply
    pub name: String,

    /// Endpoint to bind, format `tcp://<host>:<port>`; `*` listens on every interface
    pub address: String,

    /// Degrees of freedom of the device (number of motors, 0 for a camera)
    pub freedom: u32,

    /// Kind of device behind the server
    pub device: DeviceKind,

    // -------------------------------------------------------------------------
    // Data Configuration
    // -------------------------------------------------------------------------
    /// Snapshot served by GET until the first `set_data`
    pub initial_data: Payload,

    /// Clear the snapshot after each GET
    pub empty_data_after_get: bool,

    // -------------------------------------------------------------------------
    // Receive Loop Configuration
    // -------------------------------------------------------------------------
    /// Upper bound on how long one receive blocks before the stop flag is
    /// checked again (milliseconds)
    pub poll_interval_ms: u64,

    /// Sleep between two transport polls while idle (milliseconds)
    pub idle_sleep_ms: u64,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Max concurrent client connections
    pub max_connections: usize,

    /// Largest accepted frame body (bytes)
    pub max_frame_size: usize,

    /// Reply write timeout (milliseconds)
    pub write_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "lhc-server".to_string(),
            address: "tcp://*:5555".to_string(),
            freedom: 0,
            device: DeviceKind::Motor,
            initial_data: Payload::new(),
            empty_data_after_get: false,
            poll_interval_ms: 100,
            idle_sleep_ms: 10,
            max_connections: 64,
            max_frame_size: 16 * 1024 * 1024, // 16 MB
            write_timeout_ms: 5000,
        }
    }
}

impl ServerConfig {
    /// Create a new config builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Check the configuration before a server is built from it
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LhcError::Config("'name' must not be empty".to_string()));
        }
        parse_endpoint(&self.address)?;
        if self.poll_interval_ms == 0 {
            return Err(LhcError::Config(
                "'poll_interval_ms' must be greater than 0".to_string(),
            ));
        }
        if self.max_frame_size == 0 {
            return Err(LhcError::Config(
                "'max_frame_size' must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Identity reported by INFO
    pub fn identity(&self) -> DeviceIdentity {
        DeviceIdentity {
            name: self.name.clone(),
            address: self.address.clone(),
            freedom: self.freedom,
            device: self.device,
        }
    }
}

/// Turn a `tcp://host:port` address into a `host:port` socket address string
///
/// A `*` host maps to `0.0.0.0`.
pub fn parse_endpoint(address: &str) -> Result<String> {
    let rest = address.strip_prefix(ADDRESS_SCHEME).ok_or_else(|| {
        LhcError::Config(format!(
            "Address must start with '{}', got '{}'.",
            ADDRESS_SCHEME, address
        ))
    })?;

    let (host, port) = rest.rsplit_once(':').ok_or_else(|| {
        LhcError::Config(format!("Address '{}' is missing a port.", address))
    })?;

    if host.is_empty() {
        return Err(LhcError::Config(format!(
            "Address '{}' is missing a host.",
            address
        )));
    }

    let port: u16 = port.parse().map_err(|_| {
        LhcError::Config(format!("Address '{}' has an invalid port.", address))
    })?;

    let host = if host == "*" { "0.0.0.0" } else { host };
    Ok(format!("{}:{}", host, port))
}

/// Builder for ServerConfig
#[derive(Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Set the server name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the endpoint to bind (`tcp://host:port`)
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.config.address = address.into();
        self
    }

    /// Set the degrees of freedom
    pub fn freedom(mut self, freedom: u32) -> Self {
        self.config.freedom = freedom;
        self
    }

    /// Set the device kind
    pub fn device(mut self, device: DeviceKind) -> Self {
        self.config.device = device;
        self
    }

    /// Set the snapshot served before the first `set_data`
    pub fn initial_data(mut self, data: Payload) -> Self {
        self.config.initial_data = data;
        self
    }

    /// Clear the snapshot after each GET
    pub fn empty_data_after_get(mut self, enabled: bool) -> Self {
        self.config.empty_data_after_get = enabled;
        self
    }

    /// Set the receive poll interval (in milliseconds)
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// Set the idle sleep between polls (in milliseconds)
    pub fn idle_sleep_ms(mut self, ms: u64) -> Self {
        self.config.idle_sleep_ms = ms;
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the largest accepted frame (in bytes)
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.config.max_frame_size = size;
        self
    }

    /// Set the reply write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> ServerConfig {
        self.config
    }
}
