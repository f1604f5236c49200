//! Resolver: cache lookup, parent-first construction and cycle detection.
//!
//! No lock is held while a factory runs, so factories may resolve other components through a
//! `WeakContainer`. The types under construction are tracked per thread; re-entering one of
//! them is a cycle.

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Mutex;
use std::thread::ThreadId;

use crate::cache::{Inserted, Slot};
use crate::container::{lock, read, Inner};
use crate::key::{ComponentKey, Params};
use crate::registry::{Instance, Provider, View};
use crate::StoreError;

/// A cached instance together with its cache address.
pub(crate) struct Resolved {
    pub(crate) slot: Slot,
    pub(crate) instance: Instance,
    pub(crate) serial: u64,
}

/// Component keys under construction, per resolving thread.
pub(crate) type Chains = Mutex<HashMap<ThreadId, Vec<ComponentKey>>>;

impl Inner {
    /// Existing holder for (`requested`, `params`) or a freshly constructed one, plus the view
    /// that presents the instance as `requested`.
    pub(crate) fn resolve(
        &self,
        requested: ComponentKey,
        params: Params,
    ) -> Result<(Resolved, View), StoreError> {
        let (provider, view) = read(&self.registry).lookup(requested)?;
        let slot = Slot::new(provider.key, params);

        let cached = lock(&self.cache).lookup(&slot);
        if let Some((instance, serial)) = cached {
            tracing::trace!(component = %slot.key, params = ?slot.params, "cache hit");
            return Ok((
                Resolved {
                    slot,
                    instance,
                    serial,
                },
                view,
            ));
        }

        let resolved = self.construct(&provider, slot)?;
        Ok((resolved, view))
    }

    fn construct(&self, provider: &Provider, slot: Slot) -> Result<Resolved, StoreError> {
        let _guard = ChainGuard::enter(self, slot.key)?;

        let (parent, parent_view) = match &provider.parent {
            Some(link) => {
                let (parent, view) = self.resolve(link.key, link.params_for(&slot.params))?;
                let boxed = view(&parent.instance).ok_or(StoreError::ViewMismatch {
                    requested: link.key.name(),
                    component: parent.slot.key.name(),
                })?;
                (Some(parent), Some(boxed))
            }
            None => (None, None),
        };

        let instance = (provider.factory)(parent_view, &slot.params)?;
        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);

        let outcome = {
            let mut cache = lock(&self.cache);
            // The factory may have cleared the parent; never index under a dead slot.
            let parent_slot = parent.and_then(|p| {
                if cache.serial_of(&p.slot) == Some(p.serial) {
                    Some(p.slot)
                } else {
                    tracing::warn!(component = %slot.key, parent = %p.slot.key, "parent cleared during construction");
                    None
                }
            });
            cache.insert(slot.clone(), Instance::clone(&instance), serial, parent_slot)
        };

        match outcome {
            Inserted::Stored { serial } => {
                tracing::debug!(component = %slot.key, params = ?slot.params, serial, "constructed component");
                Ok(Resolved {
                    slot,
                    instance,
                    serial,
                })
            }
            Inserted::Existing {
                instance: existing,
                serial,
            } => {
                tracing::debug!(component = %slot.key, params = ?slot.params, "constructed concurrently, keeping cached instance");
                Ok(Resolved {
                    slot,
                    instance: existing,
                    serial,
                })
            }
        }
    }
}

/// Marks one component key as under construction on the current thread until dropped.
struct ChainGuard<'a> {
    chains: &'a Chains,
    thread: ThreadId,
}

impl<'a> ChainGuard<'a> {
    fn enter(inner: &'a Inner, key: ComponentKey) -> Result<Self, StoreError> {
        let thread = std::thread::current().id();
        let mut chains = lock(&inner.chains);
        let chain = chains.entry(thread).or_default();

        if inner.config.detect_cycles && chain.contains(&key) {
            let mut names: Vec<&'static str> = chain.iter().map(ComponentKey::name).collect();
            names.push(key.name());
            tracing::warn!(chain = %names.join(" -> "), "cyclic dependency");
            return Err(StoreError::CyclicDependency { chain: names });
        }

        let limit = inner.config.depth_limit();
        if chain.len() >= limit {
            let mut names: Vec<&'static str> = chain.iter().map(ComponentKey::name).collect();
            names.push(key.name());
            tracing::warn!(limit, "resolution depth exceeded");
            return Err(StoreError::DepthLimitExceeded {
                limit,
                chain: names,
            });
        }

        chain.push(key);
        Ok(Self {
            chains: &inner.chains,
            thread,
        })
    }
}

impl Drop for ChainGuard<'_> {
    fn drop(&mut self) {
        let mut chains = lock(self.chains);
        if let Some(chain) = chains.get_mut(&self.thread) {
            chain.pop();
            if chain.is_empty() {
                chains.remove(&self.thread);
            }
        }
    }
}
