//! Last-known status of every configured host
//!
//! The store is created once with the configured host names and never grows
//! or shrinks afterwards. Each host has its own slot guarded by its own
//! mutex, so writers for different hosts never contend and a reader only
//! waits for the single slot it is copying.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::StoreError;
use crate::models::HostStatus;

/// One host's entry in a [`Snapshot`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotEntry {
    /// Host display name
    pub name: String,
    /// Status at the time the entry was copied
    pub status: HostStatus,
}

/// Ordered point-in-time copy of the store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// When the copy was taken
    pub taken_at: DateTime<Utc>,
    /// One entry per configured host, in configuration order
    pub entries: Vec<SnapshotEntry>,
}

impl Snapshot {
    /// Looks up a host's status by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&HostStatus> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.status)
    }

    /// Number of hosts
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no hosts are configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of hosts currently in [`HostStatus::Failed`]
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.status.is_failed()).count()
    }

    /// Number of hosts without a fresh sample, failed or still connecting
    #[must_use]
    pub fn unhealthy_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.status.is_healthy()).count()
    }

    /// Returns true once no host is still [`HostStatus::Connecting`]
    #[must_use]
    pub fn all_settled(&self) -> bool {
        self.entries
            .iter()
            .all(|e| !matches!(e.status, HostStatus::Connecting))
    }
}

/// Concurrency-safe map from host name to [`HostStatus`]
#[derive(Debug)]
pub struct SnapshotStore {
    names: Vec<String>,
    index: HashMap<String, usize>,
    slots: Vec<Mutex<HostStatus>>,
}

impl SnapshotStore {
    /// Creates a store with one [`HostStatus::Connecting`] slot per name.
    ///
    /// Names keep their given order; a repeated name keeps its first position.
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered = Vec::new();
        let mut index = HashMap::new();
        for name in names {
            let name = name.into();
            if !index.contains_key(&name) {
                index.insert(name.clone(), ordered.len());
                ordered.push(name);
            }
        }
        let slots = ordered
            .iter()
            .map(|_| Mutex::new(HostStatus::Connecting))
            .collect();

        Self {
            names: ordered,
            index,
            slots,
        }
    }

    /// Atomically replaces the status of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownHost`] if `name` was not configured.
    pub fn set(&self, name: &str, status: HostStatus) -> Result<(), StoreError> {
        let idx = self.slot_index(name)?;
        self.set_at(idx, status);
        Ok(())
    }

    /// Returns a copy of one host's status.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownHost`] if `name` was not configured.
    pub fn get(&self, name: &str) -> Result<HostStatus, StoreError> {
        let idx = self.slot_index(name)?;
        Ok(self.lock(idx).clone())
    }

    /// Returns an ordered copy of every entry.
    ///
    /// Each entry reflects exactly one completed `set`; different hosts may
    /// be observed at different instants within one call.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let entries = self
            .names
            .iter()
            .enumerate()
            .map(|(idx, name)| SnapshotEntry {
                name: name.clone(),
                status: self.lock(idx).clone(),
            })
            .collect();

        Snapshot {
            taken_at: Utc::now(),
            entries,
        }
    }

    /// Configured host names in order
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of configured hosts
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no hosts are configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the write handle for `name`'s slot.
    ///
    /// The orchestrator hands exactly one of these to each host's worker.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownHost`] if `name` was not configured.
    pub fn slot(self: &Arc<Self>, name: &str) -> Result<HostSlot, StoreError> {
        let index = self.slot_index(name)?;
        Ok(HostSlot {
            store: Arc::clone(self),
            index,
        })
    }

    pub(crate) fn slot_index(&self, name: &str) -> Result<usize, StoreError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| StoreError::UnknownHost(name.to_string()))
    }

    pub(crate) fn set_at(&self, idx: usize, status: HostStatus) {
        *self.lock(idx) = status;
    }

    fn lock(&self, idx: usize) -> MutexGuard<'_, HostStatus> {
        // Slots are only ever assigned whole values, so a poisoned slot still
        // holds one complete status.
        self.slots[idx].lock().unwrap_or_else(|poisoned| {
            tracing::error!(host = %self.names[idx], "Snapshot slot lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

/// Write handle bound to one host's slot
#[derive(Debug)]
pub struct HostSlot {
    store: Arc<SnapshotStore>,
    index: usize,
}

impl HostSlot {
    /// Host name this slot belongs to
    #[must_use]
    pub fn name(&self) -> &str {
        &self.store.names[self.index]
    }

    /// Replaces the host's status
    pub fn set(&self, status: HostStatus) {
        self.store.set_at(self.index, status);
    }

    /// Returns a copy of the host's status
    #[must_use]
    pub fn get(&self) -> HostStatus {
        self.store.lock(self.index).clone()
    }
}
