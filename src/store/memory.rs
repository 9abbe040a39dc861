//! In-process store, shared between clones.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::store::{RouteStore, RouterSnapshot, StoreError};

/// Keeps the snapshot in memory. Clones share the same slot, so one clone
/// can be attached to a router while another inspects what was written.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<RouterSnapshot>>>,
    saves: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `snapshot`.
    pub fn with_snapshot(snapshot: RouterSnapshot) -> Self {
        let store = Self::default();
        *store.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
        store
    }

    pub fn snapshot(&self) -> Option<RouterSnapshot> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of completed saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }
}

impl RouteStore for MemoryStore {
    fn load(&mut self) -> Result<Option<RouterSnapshot>, StoreError> {
        Ok(self.snapshot())
    }

    fn save(&mut self, snapshot: &RouterSnapshot) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
