//! Binder: ties a holder's lifetime to a lifecycle source or to retained owners.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use orbit_core::{ClearHandle, Holder, HolderId};

use super::retained::{LinkStats, RetainedLinks, RetainedOwner};
use super::source::{LifecycleObserver, LifecycleSource, ScopeId};

/// Outcome of a bind call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Binding {
    /// A teardown callback was registered.
    Bound,
    /// The same scope (or owner) already clears this holder; nothing was registered.
    AlreadyBound,
}

type ScopeBindings = Mutex<HashSet<(ScopeId, HolderId)>>;

/// Clears its holder the first time the scope ends.
struct ClearOnDestroy {
    handle: ClearHandle,
    fired: AtomicBool,
    scope: Option<ScopeId>,
    bindings: Weak<ScopeBindings>,
}

impl LifecycleObserver for ClearOnDestroy {
    fn on_destroy(&self) {
        if self.fired.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!(scope = ?self.scope, holder = ?self.handle.id(), "scope ended, clearing holder");
        self.handle.clear();
        if let (Some(scope), Some(bindings)) = (&self.scope, self.bindings.upgrade()) {
            bindings
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&(scope.clone(), self.handle.id()));
        }
    }
}

/// Binds holders to scopes. Clones share the same binding tables.
#[derive(Clone, Debug, Default)]
pub struct LifecycleBinder {
    scoped: Arc<ScopeBindings>,
    retained: Arc<RetainedLinks>,
}

impl LifecycleBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear `holder` when `source` ends. A source with a stable scope id gets at most one
    /// callback per holder, however many times the same scope is bound again.
    pub fn bind_once<T: ?Sized>(&self, holder: &Holder<T>, source: &dyn LifecycleSource) -> Binding {
        let scope = source.scope_id();
        if let Some(scope) = &scope {
            let fresh = self
                .scoped
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert((scope.clone(), holder.id()));
            if !fresh {
                tracing::trace!(%scope, holder = ?holder.id(), "scope already bound");
                return Binding::AlreadyBound;
            }
        }
        source.add_observer(Arc::new(ClearOnDestroy {
            handle: holder.clear_handle(),
            fired: AtomicBool::new(false),
            scope,
            bindings: Arc::downgrade(&self.scoped),
        }));
        Binding::Bound
    }

    /// Keep `holder` alive while any retained owner bound to it is open; clear it when the
    /// last one closes.
    pub fn bind_retained<T: ?Sized>(&self, holder: &Holder<T>, owner: &RetainedOwner) -> Binding {
        let id = holder.id();
        let consumer = owner.id();
        if !self.retained.attach(&id, consumer) {
            return Binding::AlreadyBound;
        }
        let links = Arc::clone(&self.retained);
        let handle = holder.clear_handle();
        owner.add_closeable(move || {
            if links.detach(&id, consumer) {
                tracing::debug!(holder = ?id, "last retained owner closed, clearing holder");
                handle.clear();
            }
        });
        Binding::Bound
    }

    /// Scope bindings whose scope has not ended yet.
    pub fn scoped_bindings(&self) -> usize {
        self.scoped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn retained_consumers(&self, holder: &HolderId) -> usize {
        self.retained.consumers_of(holder)
    }

    pub fn retained_stats(&self) -> LinkStats {
        self.retained.stats()
    }
}
