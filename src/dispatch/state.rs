//! Server state
//!
//! The data snapshot served by GET plus the immutable device identity.

use parking_lot::RwLock;

use crate::device::DeviceIdentity;
use crate::protocol::Payload;

/// Mutable state shared between the host and the receive loop
///
/// ## Concurrency
/// - `data` sits behind an `RwLock`: a GET never observes a half-replaced
///   snapshot, and `set_data` never waits on the receive loop for longer than
///   one clone of the snapshot.
/// - `identity` is immutable after construction.
pub struct ServerState {
    identity: DeviceIdentity,
    data: RwLock<Payload>,
    empty_data_after_get: bool,
}

impl ServerState {
    pub fn new(identity: DeviceIdentity, data: Payload, empty_data_after_get: bool) -> Self {
        Self {
            identity,
            data: RwLock::new(data),
            empty_data_after_get,
        }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Replace the snapshot
    pub fn set_data(&self, data: Payload) {
        *self.data.write() = data;
        tracing::debug!("[Server {}] New data snapshot set.", self.identity.name);
    }

    /// Copy of the current snapshot
    pub fn data(&self) -> Payload {
        self.data.read().clone()
    }

    /// Reset the snapshot to an empty map
    pub fn empty_data(&self) {
        self.data.write().clear();
        tracing::debug!("[Server {}] Data snapshot emptied.", self.identity.name);
    }

    /// Snapshot for a GET reply
    ///
    /// With `empty_data_after_get` the snapshot is taken and cleared under a
    /// single write lock, so no concurrent `set_data` can be lost in between.
    pub fn data_for_get(&self) -> Payload {
        if self.empty_data_after_get {
            std::mem::take(&mut *self.data.write())
        } else {
            self.data()
        }
    }

    pub fn empties_after_get(&self) -> bool {
        self.empty_data_after_get
    }
}
