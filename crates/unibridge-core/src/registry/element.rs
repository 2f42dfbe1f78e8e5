//! Per-session element handle registry.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use unibridge_protocols::command::ElementRef;
use unibridge_protocols::error::BridgeError;
use unibridge_protocols::types::{
    ElementHandle, ElementId, ElementSnapshot, ElementState, Locator, SessionId,
};

struct Entry {
    backend_ref: String,
    locator: Locator,
    cached: Option<ElementSnapshot>,
}

#[derive(Default)]
struct Partition {
    /// Last identifier handed out; never decremented.
    last_id: u64,
    entries: HashMap<ElementId, Entry>,
    terminated: bool,
}

/// Maps element identifiers to backend locator state, one partition per session.
///
/// Every operation on a partition runs under that partition's lock, so a
/// resolve racing with `invalidate_all` sees either the full pre-termination
/// state or a terminated partition. A terminated partition is dropped from the
/// map; callers still holding it observe the terminated flag, later callers
/// find no partition at all.
pub struct ElementRegistry {
    partitions: DashMap<SessionId, Arc<Mutex<Partition>>>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self {
            partitions: DashMap::new(),
        }
    }

    /// Create the partition for a new session.
    pub fn open(&self, session_id: SessionId) {
        self.partitions.entry(session_id).or_default();
    }

    fn partition(&self, session_id: &SessionId) -> Option<Arc<Mutex<Partition>>> {
        self.partitions.get(session_id).map(|p| p.clone())
    }

    /// Register one located element and return its new handle.
    pub fn register(
        &self,
        session_id: SessionId,
        locator: Locator,
        element: ElementRef,
    ) -> Result<ElementHandle, BridgeError> {
        let mut handles = self.register_all(session_id, &locator, vec![element])?;
        handles
            .pop()
            .ok_or_else(|| BridgeError::protocol("registration produced no handle"))
    }

    /// Register a batch of elements located by the same query.
    ///
    /// The batch is registered atomically with respect to invalidation.
    pub fn register_all(
        &self,
        session_id: SessionId,
        locator: &Locator,
        elements: Vec<ElementRef>,
    ) -> Result<Vec<ElementHandle>, BridgeError> {
        let partition = self.partition(&session_id).ok_or_else(|| {
            BridgeError::transport(format!("session {} is not open", session_id))
        })?;
        let mut partition = partition.lock();
        if partition.terminated {
            return Err(BridgeError::transport(format!(
                "session {} is terminated",
                session_id
            )));
        }

        let mut handles = Vec::with_capacity(elements.len());
        for element in elements {
            partition.last_id += 1;
            let id = ElementId(partition.last_id);
            partition.entries.insert(
                id,
                Entry {
                    backend_ref: element.backend_ref,
                    locator: locator.clone(),
                    cached: element.snapshot.clone(),
                },
            );
            handles.push(ElementHandle {
                id,
                session_id,
                locator: locator.clone(),
                cached: element.snapshot,
            });
        }
        Ok(handles)
    }

    /// Resolve a handle to its backend state.
    ///
    /// The cached snapshot is handed out with the first lookup and cleared.
    pub fn resolve(&self, handle: &ElementHandle) -> Result<ElementState, BridgeError> {
        let partition = self
            .partition(&handle.session_id)
            .ok_or_else(|| BridgeError::stale_element(format!("{}: unknown session", handle)))?;
        let mut partition = partition.lock();
        if partition.terminated {
            return Err(BridgeError::stale_element(format!(
                "{}: session {} is terminated",
                handle, handle.session_id
            )));
        }

        let entry = partition.entries.get_mut(&handle.id).ok_or_else(|| {
            BridgeError::stale_element(format!("{}: element is no longer attached", handle))
        })?;
        Ok(ElementState {
            backend_ref: entry.backend_ref.clone(),
            locator: entry.locator.clone(),
            cached: entry.cached.take(),
        })
    }

    /// Drop a single handle after the backend reported it detached.
    pub fn invalidate(&self, handle: &ElementHandle) {
        if let Some(partition) = self.partition(&handle.session_id) {
            partition.lock().entries.remove(&handle.id);
        }
    }

    /// Invalidate every handle of a session; later lookups fail as stale.
    pub fn invalidate_all(&self, session_id: SessionId) {
        if let Some((_, partition)) = self.partitions.remove(&session_id) {
            let mut partition = partition.lock();
            partition.terminated = true;
            partition.entries.clear();
        }
    }

    /// Number of sessions with an open partition.
    pub fn session_count(&self) -> usize {
        self.partitions.len()
    }

    /// Number of live handles in a session.
    pub fn live_count(&self, session_id: SessionId) -> usize {
        self.partition(&session_id)
            .map(|p| p.lock().entries.len())
            .unwrap_or(0)
    }

    /// Whether the session's partition has been invalidated.
    pub fn is_terminated(&self, session_id: SessionId) -> bool {
        self.partition(&session_id)
            .map(|p| p.lock().terminated)
            .unwrap_or(true)
    }
}

impl Default for ElementRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "element_tests.rs"]
mod tests;
