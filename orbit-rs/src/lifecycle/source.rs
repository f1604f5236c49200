//! Lifecycle sources: "notify me when scope X ends".

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Stable identity of a logical scope, e.g. a navigation back-stack entry. Two notification
/// objects carrying the same id describe the same scope.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(String);

impl ScopeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScopeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ScopeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Callback run when the observed scope is destroyed.
pub trait LifecycleObserver: Send + Sync {
    fn on_destroy(&self);
}

/// The one capability consumed from the host: register a teardown observer for a scope.
pub trait LifecycleSource {
    /// Stable scope identity, when the host has one.
    fn scope_id(&self) -> Option<ScopeId>;

    fn add_observer(&self, observer: Arc<dyn LifecycleObserver>);
}

#[derive(Default)]
struct ScopeState {
    destroyed: bool,
    observers: Vec<Arc<dyn LifecycleObserver>>,
}

/// In-memory lifecycle source. `destroy` notifies each registered observer once; observers
/// added after destruction are notified immediately.
#[derive(Default)]
pub struct ScopeLifecycle {
    id: Option<ScopeId>,
    state: Mutex<ScopeState>,
}

impl ScopeLifecycle {
    /// Scope without a stable id.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: impl Into<ScopeId>) -> Self {
        Self {
            id: Some(id.into()),
            state: Mutex::default(),
        }
    }

    pub fn destroy(&self) {
        let observers = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            std::mem::take(&mut state.observers)
        };
        tracing::debug!(scope = ?self.id, observers = observers.len(), "scope destroyed");
        for observer in observers {
            observer.on_destroy();
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .destroyed
    }

    /// Observers waiting for `destroy`.
    pub fn observer_count(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .observers
            .len()
    }
}

impl LifecycleSource for ScopeLifecycle {
    fn scope_id(&self) -> Option<ScopeId> {
        self.id.clone()
    }

    fn add_observer(&self, observer: Arc<dyn LifecycleObserver>) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if !state.destroyed {
                state.observers.push(observer);
                return;
            }
        }
        observer.on_destroy();
    }
}

impl fmt::Debug for ScopeLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeLifecycle")
            .field("id", &self.id)
            .field("destroyed", &self.is_destroyed())
            .field("observers", &self.observer_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(AtomicUsize);

    impl LifecycleObserver for Counter {
        fn on_destroy(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn destroy_notifies_once() {
        let scope = ScopeLifecycle::with_id("detail/3");
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        scope.add_observer(counter.clone());
        assert_eq!(scope.observer_count(), 1);

        scope.destroy();
        scope.destroy();
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert_eq!(scope.observer_count(), 0);
    }

    #[test]
    fn late_observer_fires_immediately() {
        let scope = ScopeLifecycle::new();
        scope.destroy();
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        scope.add_observer(counter.clone());
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert!(scope.scope_id().is_none());
    }
}
