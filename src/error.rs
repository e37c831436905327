//! Error types for the LHC server
//!
//! Provides a unified error type for all fallible operations. Client-triggerable
//! failures (decode, validation, handler) have their own types so they can be
//! turned into error replies without ever leaving the receive loop.

use thiserror::Error;

use crate::protocol::DecodeError;

/// Result type alias using LhcError
pub type Result<T> = std::result::Result<T, LhcError>;

/// Unified error type for LHC server operations
#[derive(Debug, Error)]
pub enum LhcError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Transport error: {0}")]
    Transport(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Lifecycle error: {0}")]
    Lifecycle(String),
}

impl From<serde_json::Error> for LhcError {
    fn from(e: serde_json::Error) -> Self {
        LhcError::Serialization(e.to_string())
    }
}

/// Failure of a command handler, built-in or host callback
///
/// Always caught at the dispatcher boundary and turned into an error reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// The handler refused the request
    #[error("{0}")]
    Rejected(String),

    /// Required payload keys are absent
    #[error("Payload missing keys: {0}.")]
    MissingKey(String),

    /// The handler panicked
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    /// Convenience constructor for host callbacks
    pub fn rejected(message: impl Into<String>) -> Self {
        HandlerError::Rejected(message.into())
    }
}
