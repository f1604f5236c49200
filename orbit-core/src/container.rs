//! Container: registration builders, typed lookups, clears and teardown.

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::AtomicU64;
use std::sync::{
    Arc, Mutex, MutexGuard, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak,
};

use serde::Serialize;

use crate::cache::{KeyedCache, Removed, Slot};
use crate::config::StoreConfig;
use crate::holder::{ClearHandle, Holder};
use crate::key::{ComponentKey, Params};
use crate::registry::{
    concrete_view, Alias, Component, Factory, Instance, ParamsMap, ParentLink, Provider, Registry,
    ViewBox,
};
use crate::resolver::Chains;
use crate::StoreError;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read<T>(rw: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    rw.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(rw: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    rw.write().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) struct Inner {
    pub(crate) config: StoreConfig,
    pub(crate) registry: RwLock<Registry>,
    pub(crate) cache: Mutex<KeyedCache>,
    pub(crate) chains: Chains,
    pub(crate) next_serial: AtomicU64,
}

impl Inner {
    pub(crate) fn serial_of(&self, slot: &Slot) -> Option<u64> {
        lock(&self.cache).serial_of(slot)
    }

    pub(crate) fn remove_slot(&self, slot: &Slot, cascade_only: bool, serial: Option<u64>) {
        let removed = lock(&self.cache).remove(slot, cascade_only, serial);
        release(removed);
    }
}

/// Drop removed instances outside the cache lock, children before parents.
fn release(removed: Vec<Removed>) {
    for Removed { slot, instance } in removed.into_iter().rev() {
        tracing::debug!(component = %slot.key, params = ?slot.params, "cleared component");
        drop(instance);
    }
}

/// Counters describing the container contents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Registered providers.
    pub components: usize,
    pub aliases: usize,
    /// Live holders over all components and params.
    pub holders: usize,
    /// Components with at least one live holder.
    pub buckets: usize,
    /// Live holders that have children in the index.
    pub indexed_parents: usize,
}

/// Component container. Clones share the same registry and cache.
#[derive(Clone)]
pub struct Container {
    inner: Arc<Inner>,
}

impl Container {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                registry: RwLock::new(Registry::default()),
                cache: Mutex::new(KeyedCache::default()),
                chains: Mutex::new(HashMap::new()),
                next_serial: AtomicU64::new(1),
            }),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Start registering `C`:
    ///
    /// ```
    /// use orbit_core::{Component, Container};
    ///
    /// struct Repo;
    /// impl Component for Repo {}
    ///
    /// let container = Container::new();
    /// container.component::<Repo>().provide(|| Repo).unwrap();
    /// assert!(container.get::<Repo>().is_ok());
    /// ```
    pub fn component<C: Component>(&self) -> Registration<'_, C> {
        Registration {
            container: self,
            aliases: None,
        }
    }

    /// Never register `I` as an alias, even when a component declares it.
    pub fn exclude_alias<I: ?Sized + 'static>(&self) {
        write(&self.inner.registry).exclude(ComponentKey::of::<I>());
    }

    /// Instance of `T` (a component type or one of its alias views) for absent params.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, StoreError> {
        self.get_with::<T>(Params::none())
    }

    pub fn get_with<T: ?Sized + Send + Sync + 'static>(
        &self,
        params: Params,
    ) -> Result<Arc<T>, StoreError> {
        Ok(self.holder_with::<T>(params)?.get())
    }

    /// Holder of `T` for absent params, for callers that clear it later.
    pub fn holder<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Holder<T>, StoreError> {
        self.holder_with::<T>(Params::none())
    }

    pub fn holder_with<T: ?Sized + Send + Sync + 'static>(
        &self,
        params: Params,
    ) -> Result<Holder<T>, StoreError> {
        let requested = ComponentKey::of::<T>();
        let (resolved, view) = self.inner.resolve(requested, params)?;
        let instance = view(&resolved.instance)
            .and_then(|boxed| boxed.downcast::<Arc<T>>().ok())
            .map(|boxed| *boxed)
            .ok_or(StoreError::ViewMismatch {
                requested: requested.name(),
                component: resolved.slot.key.name(),
            })?;
        let handle = ClearHandle::new(resolved.slot, resolved.serial, Arc::downgrade(&self.inner));
        Ok(Holder::new(instance, handle))
    }

    /// Remove the instance of `T` for `params` and everything built on it. No-op when absent.
    pub fn clear<T: ?Sized + 'static>(&self, params: Params) {
        let slot = self.slot_of::<T>(params);
        self.inner.remove_slot(&slot, false, None);
    }

    /// Remove everything built on the instance of `T` for `params`, keeping the instance.
    pub fn clear_children<T: ?Sized + 'static>(&self, params: Params) {
        let slot = self.slot_of::<T>(params);
        self.inner.remove_slot(&slot, true, None);
    }

    /// Whether an instance of `T` for `params` is cached.
    pub fn contains<T: ?Sized + 'static>(&self, params: Params) -> bool {
        let slot = self.slot_of::<T>(params);
        self.inner.serial_of(&slot).is_some()
    }

    /// Number of cached instances of `T` over all params.
    pub fn cached<T: ?Sized + 'static>(&self) -> usize {
        let key = read(&self.inner.registry).resolve_alias(ComponentKey::of::<T>());
        lock(&self.inner.cache).bucket_len(&key)
    }

    /// Number of children indexed under the instance of `T` for `params`.
    pub fn children_of<T: ?Sized + 'static>(&self, params: Params) -> usize {
        let slot = self.slot_of::<T>(params);
        lock(&self.inner.cache).children_of(&slot)
    }

    pub fn stats(&self) -> StoreStats {
        let (components, aliases) = {
            let registry = read(&self.inner.registry);
            (registry.provider_count(), registry.alias_count())
        };
        let cache = lock(&self.inner.cache);
        StoreStats {
            components,
            aliases,
            holders: cache.len(),
            buckets: cache.bucket_count(),
            indexed_parents: cache.indexed_parents(),
        }
    }

    /// Drop every cached instance. Registrations stay.
    pub fn clear_all(&self) {
        let removed = lock(&self.inner.cache).drain();
        tracing::debug!(count = removed.len(), "clearing all components");
        release(removed);
    }

    /// Drop every cached instance, registration and alias exclusion. The container can be
    /// registered into again afterwards.
    pub fn shutdown_and_clear_all(&self) {
        self.clear_all();
        write(&self.inner.registry).clear();
        tracing::debug!("container shut down");
    }

    /// Handle for factories that resolve other components; does not keep the container alive.
    pub fn downgrade(&self) -> WeakContainer {
        WeakContainer {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn slot_of<T: ?Sized + 'static>(&self, params: Params) -> Slot {
        let key = read(&self.inner.registry).resolve_alias(ComponentKey::of::<T>());
        Slot::new(key, params)
    }

    fn register<C>(&self, provider: Provider, aliases: Vec<Alias<C>>) -> Result<(), StoreError> {
        let aliases = aliases.into_iter().map(|a| (a.key, a.view)).collect();
        write(&self.inner.registry).register(provider, aliases)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Non-owning container handle.
#[derive(Clone)]
pub struct WeakContainer {
    inner: Weak<Inner>,
}

impl WeakContainer {
    pub fn upgrade(&self) -> Option<Container> {
        self.inner.upgrade().map(|inner| Container { inner })
    }
}

impl fmt::Debug for WeakContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakContainer")
    }
}

/// Process-wide default container.
pub fn global() -> &'static Container {
    static GLOBAL: OnceLock<Container> = OnceLock::new();
    GLOBAL.get_or_init(Container::new)
}

fn typed_params<'p, C, P: 'static>(params: &'p Params) -> Result<&'p P, StoreError> {
    params.get::<P>().ok_or(StoreError::InvalidParams {
        component: type_name::<C>(),
        expected: type_name::<P>(),
        actual: params.type_name(),
    })
}

fn parent_view<C, P: ?Sized + 'static>(parent: Option<ViewBox>) -> Result<Arc<P>, StoreError> {
    parent
        .and_then(|boxed| boxed.downcast::<Arc<P>>().ok())
        .map(|boxed| *boxed)
        .ok_or(StoreError::ViewMismatch {
            requested: type_name::<P>(),
            component: type_name::<C>(),
        })
}

/// Builder returned by `Container::component`. Nothing is registered until a `provide*` call.
pub struct Registration<'a, C> {
    container: &'a Container,
    aliases: Option<Vec<Alias<C>>>,
}

impl<'a, C: Component> Registration<'a, C> {
    /// Replace the aliases declared by `Component::aliases`.
    pub fn aliases(mut self, aliases: Vec<Alias<C>>) -> Self {
        self.aliases = Some(aliases);
        self
    }

    /// Register without any alias; `C` is only reachable by its own type.
    pub fn no_aliases(self) -> Self {
        self.aliases(Vec::new())
    }

    /// Build `C` from a parent component `P` (a concrete type or an alias view).
    pub fn child_of<P: ?Sized + Send + Sync + 'static>(self) -> ChildRegistration<'a, C, P> {
        ChildRegistration {
            base: self,
            parent_params: None,
            _parent: PhantomData,
        }
    }

    pub fn provide<F>(self, make: F) -> Result<(), StoreError>
    where
        F: Fn() -> C + Send + Sync + 'static,
    {
        self.try_provide(move || Ok(make()))
    }

    pub fn try_provide<F>(self, make: F) -> Result<(), StoreError>
    where
        F: Fn() -> Result<C, StoreError> + Send + Sync + 'static,
    {
        self.finish(
            None,
            Box::new(move |_parent: Option<ViewBox>, _params: &Params| {
                Ok(Arc::new(make()?) as Instance)
            }),
        )
    }

    /// Factory receiving the lookup params as `&P`; lookups with other params fail with
    /// `InvalidParams`.
    pub fn provide_with_params<P, F>(self, make: F) -> Result<(), StoreError>
    where
        P: Send + Sync + 'static,
        F: Fn(&P) -> C + Send + Sync + 'static,
    {
        self.try_provide_with_params(move |params: &P| Ok(make(params)))
    }

    pub fn try_provide_with_params<P, F>(self, make: F) -> Result<(), StoreError>
    where
        P: Send + Sync + 'static,
        F: Fn(&P) -> Result<C, StoreError> + Send + Sync + 'static,
    {
        self.finish(
            None,
            Box::new(move |_parent: Option<ViewBox>, params: &Params| {
                let params = typed_params::<C, P>(params)?;
                Ok(Arc::new(make(params)?) as Instance)
            }),
        )
    }

    fn finish(self, parent: Option<ParentLink>, factory: Factory) -> Result<(), StoreError> {
        let aliases = self.aliases.unwrap_or_else(C::aliases);
        let provider = Provider {
            key: ComponentKey::of::<C>(),
            parent,
            factory,
            view: concrete_view::<C>(),
        };
        self.container.register(provider, aliases)
    }
}

/// Registration of a component with a parent. The parent is resolved, and cached, before the
/// child factory runs; clearing the parent clears the child.
pub struct ChildRegistration<'a, C, P: ?Sized> {
    base: Registration<'a, C>,
    parent_params: Option<ParamsMap>,
    _parent: PhantomData<fn() -> Arc<P>>,
}

impl<'a, C: Component, P: ?Sized + Send + Sync + 'static> ChildRegistration<'a, C, P> {
    /// Params used to resolve the parent. By default the parent gets the child's params.
    pub fn parent_params<F>(mut self, map: F) -> Self
    where
        F: Fn(&Params) -> Params + Send + Sync + 'static,
    {
        self.parent_params = Some(Box::new(map));
        self
    }

    pub fn provide<F>(self, make: F) -> Result<(), StoreError>
    where
        F: Fn(&P) -> C + Send + Sync + 'static,
    {
        self.try_provide(move |parent| Ok(make(parent)))
    }

    pub fn try_provide<F>(self, make: F) -> Result<(), StoreError>
    where
        F: Fn(&P) -> Result<C, StoreError> + Send + Sync + 'static,
    {
        self.finish(Box::new(
            move |parent: Option<ViewBox>, _params: &Params| {
                let parent = parent_view::<C, P>(parent)?;
                Ok(Arc::new(make(&parent)?) as Instance)
            },
        ))
    }

    pub fn provide_with_params<Q, F>(self, make: F) -> Result<(), StoreError>
    where
        Q: Send + Sync + 'static,
        F: Fn(&P, &Q) -> C + Send + Sync + 'static,
    {
        self.try_provide_with_params(move |parent: &P, params: &Q| Ok(make(parent, params)))
    }

    pub fn try_provide_with_params<Q, F>(self, make: F) -> Result<(), StoreError>
    where
        Q: Send + Sync + 'static,
        F: Fn(&P, &Q) -> Result<C, StoreError> + Send + Sync + 'static,
    {
        self.finish(Box::new(
            move |parent: Option<ViewBox>, params: &Params| {
                let parent = parent_view::<C, P>(parent)?;
                let params = typed_params::<C, Q>(params)?;
                Ok(Arc::new(make(&parent, params)?) as Instance)
            },
        ))
    }

    fn finish(self, factory: Factory) -> Result<(), StoreError> {
        let link = ParentLink {
            key: ComponentKey::of::<P>(),
            params: self.parent_params,
        };
        self.base.finish(Some(link), factory)
    }
}
