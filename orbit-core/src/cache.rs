//! Keyed cache: at most one live instance per (component, params), and the parent → children
//! index used to cascade clears.

use std::collections::{HashMap, VecDeque};

use crate::key::{ComponentKey, Params};
use crate::registry::Instance;

/// Cache address of one holder.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Slot {
    pub(crate) key: ComponentKey,
    pub(crate) params: Params,
}

impl Slot {
    pub(crate) fn new(key: ComponentKey, params: Params) -> Self {
        Self { key, params }
    }
}

struct Entry {
    instance: Instance,
    serial: u64,
    parent: Option<Slot>,
}

/// Outcome of `KeyedCache::insert`.
pub(crate) enum Inserted {
    Stored { serial: u64 },
    /// Another resolution stored the slot first; the caller's instance was not kept.
    Existing { instance: Instance, serial: u64 },
}

/// An instance taken out of the cache, in cascade order (parents before their children).
pub(crate) struct Removed {
    pub(crate) slot: Slot,
    pub(crate) instance: Instance,
}

/// Buckets per component key, one entry per params value inside a bucket.
#[derive(Default)]
pub(crate) struct KeyedCache {
    buckets: HashMap<ComponentKey, HashMap<Params, Entry>>,
    children: HashMap<Slot, Vec<Slot>>,
}

impl KeyedCache {
    pub(crate) fn lookup(&self, slot: &Slot) -> Option<(Instance, u64)> {
        self.buckets
            .get(&slot.key)
            .and_then(|bucket| bucket.get(&slot.params))
            .map(|entry| (Instance::clone(&entry.instance), entry.serial))
    }

    pub(crate) fn serial_of(&self, slot: &Slot) -> Option<u64> {
        self.buckets
            .get(&slot.key)
            .and_then(|bucket| bucket.get(&slot.params))
            .map(|entry| entry.serial)
    }

    /// Store a freshly built instance under `slot`, indexed as a child of `parent`.
    pub(crate) fn insert(
        &mut self,
        slot: Slot,
        instance: Instance,
        serial: u64,
        parent: Option<Slot>,
    ) -> Inserted {
        if let Some((instance, serial)) = self.lookup(&slot) {
            return Inserted::Existing { instance, serial };
        }
        if let Some(parent) = &parent {
            self.children
                .entry(parent.clone())
                .or_default()
                .push(slot.clone());
        }
        self.buckets.entry(slot.key).or_default().insert(
            slot.params,
            Entry {
                instance,
                serial,
                parent,
            },
        );
        Inserted::Stored { serial }
    }

    /// Remove `slot` (unless `cascade_only`) and, transitively, every child indexed under it.
    /// With `serial` set, nothing happens unless the cached entry still carries that serial.
    pub(crate) fn remove(&mut self, slot: &Slot, cascade_only: bool, serial: Option<u64>) -> Vec<Removed> {
        let mut removed = Vec::new();
        match self.serial_of(slot) {
            None => return removed,
            Some(current) if serial.is_some_and(|s| s != current) => return removed,
            Some(_) => {}
        }

        if !cascade_only {
            if let Some(entry) = self.take(slot) {
                if let Some(parent) = &entry.parent {
                    self.unlink(parent, slot);
                }
                removed.push(Removed {
                    slot: slot.clone(),
                    instance: entry.instance,
                });
            }
        }

        let mut pending: VecDeque<Slot> = self.children.remove(slot).unwrap_or_default().into();
        while let Some(child) = pending.pop_front() {
            if let Some(entry) = self.take(&child) {
                pending.extend(self.children.remove(&child).unwrap_or_default());
                removed.push(Removed {
                    slot: child,
                    instance: entry.instance,
                });
            }
        }
        removed
    }

    /// Empty the cache, parents before children where an order exists.
    pub(crate) fn drain(&mut self) -> Vec<Removed> {
        let roots: Vec<Slot> = self
            .buckets
            .iter()
            .flat_map(|(key, bucket)| {
                bucket
                    .iter()
                    .filter(|(_, entry)| entry.parent.is_none())
                    .map(|(params, _)| Slot::new(*key, params.clone()))
            })
            .collect();
        let mut removed = Vec::new();
        for root in roots {
            removed.extend(self.remove(&root, false, None));
        }
        // Anything not reachable from a root.
        for (key, bucket) in self.buckets.drain() {
            for (params, entry) in bucket {
                removed.push(Removed {
                    slot: Slot::new(key, params),
                    instance: entry.instance,
                });
            }
        }
        self.children.clear();
        removed
    }

    fn take(&mut self, slot: &Slot) -> Option<Entry> {
        let bucket = self.buckets.get_mut(&slot.key)?;
        let entry = bucket.remove(&slot.params);
        if bucket.is_empty() {
            self.buckets.remove(&slot.key);
        }
        entry
    }

    fn unlink(&mut self, parent: &Slot, child: &Slot) {
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.retain(|s| s != child);
            if siblings.is_empty() {
                self.children.remove(parent);
            }
        }
    }

    /// Live holders.
    pub(crate) fn len(&self) -> usize {
        self.buckets.values().map(HashMap::len).sum()
    }

    /// Component keys with at least one live holder.
    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn bucket_len(&self, key: &ComponentKey) -> usize {
        self.buckets.get(key).map_or(0, HashMap::len)
    }

    /// Parents that currently have indexed children.
    pub(crate) fn indexed_parents(&self) -> usize {
        self.children.len()
    }

    pub(crate) fn children_of(&self, slot: &Slot) -> usize {
        self.children.get(slot).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct A;
    struct B;
    struct C;

    fn slot<T: 'static>(params: Params) -> Slot {
        Slot::new(ComponentKey::of::<T>(), params)
    }

    fn put(cache: &mut KeyedCache, slot: Slot, serial: u64, parent: Option<Slot>) {
        let stored = cache.insert(slot, Arc::new(serial), serial, parent);
        assert!(matches!(stored, Inserted::Stored { .. }));
    }

    fn tree() -> KeyedCache {
        let mut cache = KeyedCache::default();
        put(&mut cache, slot::<A>(Params::none()), 1, None);
        put(&mut cache, slot::<B>(Params::none()), 2, Some(slot::<A>(Params::none())));
        put(&mut cache, slot::<C>(Params::none()), 3, Some(slot::<A>(Params::none())));
        cache
    }

    #[test]
    fn insert_keeps_first_instance() {
        let mut cache = KeyedCache::default();
        put(&mut cache, slot::<A>(Params::none()), 1, None);
        match cache.insert(slot::<A>(Params::none()), Arc::new(9u64), 9, None) {
            Inserted::Existing { serial, .. } => assert_eq!(serial, 1),
            Inserted::Stored { .. } => panic!("slot was already filled"),
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn removing_parent_cascades() {
        let mut cache = tree();
        assert_eq!(cache.indexed_parents(), 1);
        let removed = cache.remove(&slot::<A>(Params::none()), false, None);
        assert_eq!(removed.len(), 3);
        assert_eq!(removed[0].slot, slot::<A>(Params::none()));
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.bucket_count(), 0);
        assert_eq!(cache.indexed_parents(), 0);
    }

    #[test]
    fn removing_children_leaves_no_index() {
        let mut cache = tree();
        cache.remove(&slot::<B>(Params::none()), false, None);
        assert_eq!(cache.children_of(&slot::<A>(Params::none())), 1);
        cache.remove(&slot::<C>(Params::none()), false, None);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.indexed_parents(), 0);
    }

    #[test]
    fn cascade_only_keeps_parent() {
        let mut cache = tree();
        let removed = cache.remove(&slot::<A>(Params::none()), true, None);
        assert_eq!(removed.len(), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.serial_of(&slot::<A>(Params::none())), Some(1));
    }

    #[test]
    fn stale_serial_is_ignored() {
        let mut cache = tree();
        assert!(cache.remove(&slot::<A>(Params::none()), false, Some(42)).is_empty());
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.remove(&slot::<A>(Params::none()), false, Some(1)).len(), 3);
    }

    #[test]
    fn bucket_dropped_with_last_params() {
        let mut cache = KeyedCache::default();
        put(&mut cache, slot::<A>(Params::new("1")), 1, None);
        put(&mut cache, slot::<A>(Params::new("2")), 2, None);
        assert_eq!(cache.bucket_len(&ComponentKey::of::<A>()), 2);
        cache.remove(&slot::<A>(Params::new("1")), false, None);
        assert_eq!(cache.bucket_count(), 1);
        cache.remove(&slot::<A>(Params::new("2")), false, None);
        assert_eq!(cache.bucket_count(), 0);
    }

    #[test]
    fn drain_empties_everything() {
        let mut cache = tree();
        put(&mut cache, slot::<A>(Params::new(7u8)), 4, None);
        let removed = cache.drain();
        assert_eq!(removed.len(), 4);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.indexed_parents(), 0);
    }
}
