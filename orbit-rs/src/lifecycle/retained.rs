//! Retained owners and the consumer reference counts that keep a holder alive across them.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use orbit_core::HolderId;
use serde::Serialize;

/// Identity of one retained owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConsumerId(u64);

impl ConsumerId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

type Closeable = Box<dyn FnOnce() + Send>;

/// Longer-lived owner (survives recreation of the transient scope that created it). Runs its
/// closeables once, on `close` or on drop, in the order they were added.
pub struct RetainedOwner {
    id: ConsumerId,
    closeables: Mutex<Option<Vec<Closeable>>>,
}

impl RetainedOwner {
    pub fn new() -> Self {
        Self {
            id: ConsumerId::next(),
            closeables: Mutex::new(Some(Vec::new())),
        }
    }

    pub fn id(&self) -> ConsumerId {
        self.id
    }

    /// Runs `close` immediately when the owner is already closed.
    pub fn add_closeable(&self, close: impl FnOnce() + Send + 'static) {
        {
            let mut closeables = self.closeables.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(pending) = closeables.as_mut() {
                pending.push(Box::new(close));
                return;
            }
        }
        close();
    }

    pub fn close(&self) {
        let pending = self
            .closeables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(pending) = pending {
            tracing::debug!(owner = ?self.id, closeables = pending.len(), "retained owner closed");
            for close in pending {
                close();
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closeables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl Default for RetainedOwner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RetainedOwner {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for RetainedOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetainedOwner")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Size of the link table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    pub holders: usize,
    pub consumers: usize,
}

/// Which consumers currently use which holder.
#[derive(Default)]
pub struct RetainedLinks {
    links: Mutex<HashMap<HolderId, HashSet<ConsumerId>>>,
}

impl RetainedLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// False when `consumer` was already linked to `holder`.
    pub fn attach(&self, holder: &HolderId, consumer: ConsumerId) -> bool {
        self.links
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(holder.clone())
            .or_default()
            .insert(consumer)
    }

    /// Unlink `consumer`; true when no consumer of `holder` remains.
    pub fn detach(&self, holder: &HolderId, consumer: ConsumerId) -> bool {
        let mut links = self.links.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(consumers) = links.get_mut(holder) else {
            return true;
        };
        consumers.remove(&consumer);
        if consumers.is_empty() {
            links.remove(holder);
            true
        } else {
            false
        }
    }

    pub fn consumers_of(&self, holder: &HolderId) -> usize {
        self.links
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(holder)
            .map_or(0, HashSet::len)
    }

    pub fn stats(&self) -> LinkStats {
        let links = self.links.lock().unwrap_or_else(PoisonError::into_inner);
        LinkStats {
            holders: links.len(),
            consumers: links.values().map(HashSet::len).sum(),
        }
    }
}

impl fmt::Debug for RetainedLinks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetainedLinks")
            .field("stats", &self.stats())
            .finish()
    }
}
