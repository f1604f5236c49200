//! Registry: one provider per component type, plus alias views and the alias exclusion list.
//! Registrations live as long as the container; there is no removal of a single provider.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::key::{ComponentKey, Params};
use crate::{StoreError, Unregistered};

/// A constructed component, type-erased.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

/// Erased `Arc<T>` for some requested view `T` (the concrete type or an alias trait object).
pub(crate) type ViewBox = Box<dyn Any + Send + Sync>;

/// Turns an instance into the boxed `Arc<T>` of one view; `None` if the instance is of another type.
pub(crate) type View = Arc<dyn Fn(&Instance) -> Option<ViewBox> + Send + Sync>;

/// Builds an instance from the parent view (if the provider has a parent) and the params.
pub(crate) type Factory =
    Box<dyn Fn(Option<ViewBox>, &Params) -> Result<Instance, StoreError> + Send + Sync>;

pub(crate) type ParamsMap = Box<dyn Fn(&Params) -> Params + Send + Sync>;

/// A type the container can construct and cache.
///
/// `aliases` lists the capability views (`dyn Trait`) the type can be looked up by when it is
/// registered without an explicit alias list. `#[derive(Component)]` in `orbit-rs` generates it.
pub trait Component: Send + Sync + 'static {
    fn aliases() -> Vec<Alias<Self>>
    where
        Self: Sized,
    {
        Vec::new()
    }
}

/// Secondary lookup identifier for a component: a trait object `I` the component `C` coerces to.
pub struct Alias<C> {
    pub(crate) key: ComponentKey,
    pub(crate) view: View,
    _component: PhantomData<fn() -> C>,
}

impl<C: Send + Sync + 'static> Alias<C> {
    /// `Alias::of::<dyn Api>(|c| c)`: the cast is usually the unsizing coercion itself.
    pub fn of<I>(cast: fn(Arc<C>) -> Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let view: View = Arc::new(move |instance: &Instance| {
            let concrete = Arc::clone(instance).downcast::<C>().ok()?;
            Some(Box::new(cast(concrete)) as ViewBox)
        });
        Self {
            key: ComponentKey::of::<I>(),
            view,
            _component: PhantomData,
        }
    }

    pub fn key(&self) -> ComponentKey {
        self.key
    }
}

impl<C> fmt::Debug for Alias<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Alias").field(&self.key).finish()
    }
}

/// View of an instance as its own concrete type.
pub(crate) fn concrete_view<C: Send + Sync + 'static>() -> View {
    Arc::new(|instance: &Instance| {
        Arc::clone(instance)
            .downcast::<C>()
            .ok()
            .map(|c| Box::new(c) as ViewBox)
    })
}

/// Parent declared at registration: the key it is looked up by and how the child's params map to it.
pub(crate) struct ParentLink {
    pub(crate) key: ComponentKey,
    pub(crate) params: Option<ParamsMap>,
}

impl ParentLink {
    pub(crate) fn params_for(&self, child: &Params) -> Params {
        match &self.params {
            Some(map) => map(child),
            None => child.clone(),
        }
    }
}

pub(crate) struct Provider {
    pub(crate) key: ComponentKey,
    pub(crate) parent: Option<ParentLink>,
    pub(crate) factory: Factory,
    pub(crate) view: View,
}

struct AliasEntry {
    target: ComponentKey,
    view: View,
}

/// Providers by concrete key, aliases by view key.
#[derive(Default)]
pub(crate) struct Registry {
    providers: HashMap<ComponentKey, Arc<Provider>>,
    aliases: HashMap<ComponentKey, AliasEntry>,
    excluded: HashSet<ComponentKey>,
}

impl Registry {
    /// Add a provider and its aliases. Nothing is stored unless every check passes.
    pub(crate) fn register(
        &mut self,
        provider: Provider,
        aliases: Vec<(ComponentKey, View)>,
    ) -> Result<(), StoreError> {
        let component = provider.key;
        if self.providers.contains_key(&component) {
            return Err(StoreError::DuplicateRegistration {
                component: component.name(),
            });
        }
        // A concrete key already claimed as an alias would never reach its own provider.
        if let Some(existing) = self.aliases.get(&component) {
            return Err(StoreError::DuplicateAlias {
                alias: component.name(),
                component: component.name(),
                existing: existing.target.name(),
            });
        }

        let mut accepted: Vec<(ComponentKey, View)> = Vec::with_capacity(aliases.len());
        for (alias, view) in aliases {
            if alias == component || self.excluded.contains(&alias) {
                tracing::trace!(%alias, %component, "alias skipped");
                continue;
            }
            if accepted.iter().any(|(seen, _)| *seen == alias) {
                continue;
            }
            if let Some(existing) = self.aliases.get(&alias) {
                return Err(StoreError::DuplicateAlias {
                    alias: alias.name(),
                    component: component.name(),
                    existing: existing.target.name(),
                });
            }
            if self.providers.contains_key(&alias) {
                return Err(StoreError::DuplicateAlias {
                    alias: alias.name(),
                    component: component.name(),
                    existing: alias.name(),
                });
            }
            accepted.push((alias, view));
        }

        for (alias, view) in accepted {
            self.aliases.insert(
                alias,
                AliasEntry {
                    target: component,
                    view,
                },
            );
        }
        tracing::debug!(%component, parent = ?provider.parent.as_ref().map(|p| p.key), "registered component");
        self.providers.insert(component, Arc::new(provider));
        Ok(())
    }

    pub(crate) fn exclude(&mut self, alias: ComponentKey) {
        self.excluded.insert(alias);
    }

    /// The concrete key behind `key`; `key` itself when it is not an alias.
    pub(crate) fn resolve_alias(&self, key: ComponentKey) -> ComponentKey {
        self.aliases.get(&key).map_or(key, |entry| entry.target)
    }

    /// Provider for `requested` (alias or concrete) and the view that presents its instance as `requested`.
    pub(crate) fn lookup(&self, requested: ComponentKey) -> Result<(Arc<Provider>, View), StoreError> {
        let (target, view) = match self.aliases.get(&requested) {
            Some(entry) => (entry.target, Some(Arc::clone(&entry.view))),
            None => (requested, None),
        };
        let provider = self.providers.get(&target).ok_or_else(|| {
            let reason = if self.excluded.contains(&requested) {
                Unregistered::ExcludedAlias
            } else {
                Unregistered::NeverRegistered
            };
            StoreError::UnregisteredComponent {
                component: requested.name(),
                reason,
            }
        })?;
        let view = view.unwrap_or_else(|| Arc::clone(&provider.view));
        Ok((Arc::clone(provider), view))
    }

    pub(crate) fn provider_count(&self) -> usize {
        self.providers.len()
    }

    pub(crate) fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    pub(crate) fn clear(&mut self) {
        self.providers.clear();
        self.aliases.clear();
        self.excluded.clear();
    }
}
