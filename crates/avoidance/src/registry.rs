//! Registry of long-lived actor handles
//!
//! The registry is the only state the solver keeps across ticks. It is
//! locked while a tick is being solved; structural changes during that
//! window are rejected.

use avoidance_common::{Error, Result};

use crate::actor::ActorHandle;
use crate::config::MAX_REGISTERED_ACTORS;

/// Registered actor handles
#[derive(Debug)]
pub struct ActorRegistry {
    /// Handles in registration order
    handles: Vec<ActorHandle>,
    /// Maximum number of handles
    capacity: usize,
    /// Set while a tick is in progress
    updating: bool,
}

impl Default for ActorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ActorRegistry {
    /// Creates a registry sized to the feasible-area vertex budget
    pub fn new() -> Self {
        Self::with_capacity(MAX_REGISTERED_ACTORS)
    }

    /// Creates a registry holding at most `capacity` handles.
    ///
    /// The capacity is never raised above [`MAX_REGISTERED_ACTORS`], which is
    /// what keeps the constraint count within the feasible-area buffer.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(MAX_REGISTERED_ACTORS);
        Self {
            handles: Vec::with_capacity(capacity),
            capacity,
            updating: false,
        }
    }

    /// Registers a handle. Registering an already known handle succeeds
    /// without adding it twice.
    pub fn register(&mut self, handle: ActorHandle) -> Result<()> {
        if handle.is_null() {
            log::warn!("Rejected registration of the null actor handle");
            return Err(Error::InvalidHandle);
        }

        if self.updating {
            log::warn!(
                "Rejected registration of actor {} during a tick",
                handle.id()
            );
            return Err(Error::UpdateInProgress);
        }

        if self.contains(handle) {
            return Ok(());
        }

        if self.handles.len() >= self.capacity {
            log::warn!(
                "Rejected registration of actor {}: capacity of {} reached",
                handle.id(),
                self.capacity
            );
            return Err(Error::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        self.handles.push(handle);
        Ok(())
    }

    /// Unregisters a handle. Returns `false` if it was not registered.
    pub fn unregister(&mut self, handle: ActorHandle) -> Result<bool> {
        if handle.is_null() {
            log::warn!("Rejected unregistration of the null actor handle");
            return Err(Error::InvalidHandle);
        }

        if self.updating {
            log::warn!(
                "Rejected unregistration of actor {} during a tick",
                handle.id()
            );
            return Err(Error::UpdateInProgress);
        }

        match self.handles.iter().position(|&h| h == handle) {
            Some(index) => {
                self.handles.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Checks whether `handle` is registered
    pub fn contains(&self, handle: ActorHandle) -> bool {
        self.handles.contains(&handle)
    }

    /// Registered handles in registration order
    pub fn handles(&self) -> &[ActorHandle] {
        &self.handles
    }

    /// Number of registered handles
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Checks whether no handle is registered
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Maximum number of handles
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Checks whether a tick is in progress
    pub fn is_updating(&self) -> bool {
        self.updating
    }

    pub(crate) fn set_updating(&mut self, updating: bool) {
        self.updating = updating;
    }
}
