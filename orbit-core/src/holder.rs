//! Holder: a live instance plus what it takes to clear it from the cache later.

use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Weak};

use crate::cache::Slot;
use crate::container::Inner;
use crate::key::{ComponentKey, Params};

/// Identity of one cached instance. A holder built after a clear of the same
/// (component, params) gets a new serial, so ids never repeat within a container.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HolderId {
    pub component: ComponentKey,
    pub params: Params,
    pub serial: u64,
}

/// Untyped clear capability of a holder. Cheap to clone; does not keep the container alive.
#[derive(Clone)]
pub struct ClearHandle {
    slot: Slot,
    serial: u64,
    store: Weak<Inner>,
}

impl ClearHandle {
    pub(crate) fn new(slot: Slot, serial: u64, store: Weak<Inner>) -> Self {
        Self { slot, serial, store }
    }

    pub fn id(&self) -> HolderId {
        HolderId {
            component: self.slot.key,
            params: self.slot.params.clone(),
            serial: self.serial,
        }
    }

    /// Remove the instance and every child built on it. No-op when already cleared.
    pub fn clear(&self) {
        self.remove(false);
    }

    /// Remove every child built on the instance and keep the instance cached.
    pub fn clear_children(&self) {
        self.remove(true);
    }

    /// Whether the cache still holds this exact instance.
    pub fn is_live(&self) -> bool {
        self.store
            .upgrade()
            .is_some_and(|store| store.serial_of(&self.slot) == Some(self.serial))
    }

    fn remove(&self, cascade_only: bool) {
        if let Some(store) = self.store.upgrade() {
            store.remove_slot(&self.slot, cascade_only, Some(self.serial));
        }
    }
}

impl fmt::Debug for ClearHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClearHandle")
            .field("component", &self.slot.key)
            .field("params", &self.slot.params)
            .field("serial", &self.serial)
            .finish()
    }
}

/// A component instance handed out by the container, viewed as `T`.
///
/// After `clear` the holder still derefs to the instance it was created with; that instance is
/// no longer cached and will not be handed out again.
pub struct Holder<T: ?Sized> {
    instance: Arc<T>,
    handle: ClearHandle,
}

impl<T: ?Sized> Holder<T> {
    pub(crate) fn new(instance: Arc<T>, handle: ClearHandle) -> Self {
        Self { instance, handle }
    }

    pub fn get(&self) -> Arc<T> {
        Arc::clone(&self.instance)
    }

    pub fn id(&self) -> HolderId {
        self.handle.id()
    }

    pub fn params(&self) -> &Params {
        &self.handle.slot.params
    }

    pub fn clear(&self) {
        self.handle.clear();
    }

    pub fn clear_children(&self) {
        self.handle.clear_children();
    }

    pub fn is_live(&self) -> bool {
        self.handle.is_live()
    }

    pub fn clear_handle(&self) -> ClearHandle {
        self.handle.clone()
    }
}

impl<T: ?Sized> Clone for Holder<T> {
    fn clone(&self) -> Self {
        Self {
            instance: Arc::clone(&self.instance),
            handle: self.handle.clone(),
        }
    }
}

impl<T: ?Sized> Deref for Holder<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.instance
    }
}

impl<T: ?Sized> fmt::Debug for Holder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Holder")
            .field("component", &self.handle.slot.key)
            .field("params", &self.handle.slot.params)
            .field("serial", &self.handle.serial)
            .finish()
    }
}
