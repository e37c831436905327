//! Command definitions
//!
//! The closed vocabulary a client may request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Command {
    /// Device identity and capabilities
    Info,

    /// Liveness check
    Ping,

    /// Fetch the current data snapshot
    Get,

    /// New positions for the device
    Set,

    /// New saving path
    Save,

    /// Device-specific options
    Opt,

    /// Shut the server down
    Stop,
}

impl Command {
    /// Full vocabulary in canonical order (also the INFO capabilities list)
    pub const ALL: [Command; 7] = [
        Command::Info,
        Command::Ping,
        Command::Get,
        Command::Set,
        Command::Save,
        Command::Stop,
        Command::Opt,
    ];

    /// Wire name of the command
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Info => "INFO",
            Command::Ping => "PING",
            Command::Get => "GET",
            Command::Set => "SET",
            Command::Save => "SAVE",
            Command::Opt => "OPT",
            Command::Stop => "STOP",
        }
    }

    /// Note attached to a successful reply
    pub fn ack_message(&self) -> &'static str {
        match self {
            Command::Info => "Information transmitted.",
            Command::Ping => "Still alive.",
            Command::Get => "Data transmitted.",
            Command::Set => "Positions received.",
            Command::Save => "Saving path received.",
            Command::Opt => "Options received.",
            Command::Stop => "Server stopping.",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not part of the vocabulary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|cmd| cmd.as_str() == s)
            .ok_or_else(|| UnknownCommand(s.to_string()))
    }
}
