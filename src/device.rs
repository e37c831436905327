//! Device identity
//!
//! Immutable metadata describing the endpoint a server drives. Reported
//! verbatim by the INFO command.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LhcError;

/// Kind of device behind the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Motor controller; `freedom` is the number of driven axes
    Motor,

    /// Camera; `freedom` is usually 0
    Camera,
}

impl DeviceKind {
    /// Every supported kind, in declaration order
    pub const ALL: [DeviceKind; 2] = [DeviceKind::Motor, DeviceKind::Camera];

    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Motor => "motor",
            DeviceKind::Camera => "camera",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceKind {
    type Err = LhcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = DeviceKind::ALL.iter().map(|k| k.as_str()).collect();
                LhcError::Config(format!(
                    "Invalid device: '{}'. Choose among {:?}.",
                    s, names
                ))
            })
    }
}

/// Identity of the device a server fronts
///
/// Set once at construction, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Server name, also used as the `from` field of every reply
    pub name: String,

    /// Configured endpoint, e.g. `tcp://*:5555`
    pub address: String,

    /// Degrees of freedom (opaque to the protocol)
    pub freedom: u32,

    /// Device kind
    pub device: DeviceKind,
}
