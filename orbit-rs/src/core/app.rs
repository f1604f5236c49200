//! Application: a container plus the lifecycle binder that releases its holders.

use orbit_core::{Container, Holder, Params, StoreConfig, StoreError};

use super::module::Module;
use crate::lifecycle::{Binding, LifecycleBinder, LifecycleSource, RetainedOwner};

/// Application: registers modules into its container and hands out lifecycle-bound holders.
#[derive(Clone, Debug, Default)]
pub struct Application {
    pub(crate) container: Container,
    pub(crate) binder: LifecycleBinder,
}

impl Application {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self::with_container(Container::with_config(config))
    }

    /// Share an existing container, e.g. `orbit_core::global().clone()`.
    pub fn with_container(container: Container) -> Self {
        Self {
            container,
            binder: LifecycleBinder::new(),
        }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn binder(&self) -> &LifecycleBinder {
        &self.binder
    }

    pub fn register(&mut self, module: &mut dyn Module) -> Result<(), StoreError> {
        module.register_into(self)
    }

    /// Holder of `T` for `params`, cleared when `source` ends.
    pub fn scoped<T: ?Sized + Send + Sync + 'static>(
        &self,
        params: Params,
        source: &dyn LifecycleSource,
    ) -> Result<Holder<T>, StoreError> {
        let holder = self.container.holder_with::<T>(params)?;
        if self.binder.bind_once(&holder, source) == Binding::AlreadyBound {
            tracing::trace!(holder = ?holder.id(), "reusing scope binding");
        }
        Ok(holder)
    }

    /// Holder of `T` for `params`, cleared when the last owner retaining it closes.
    pub fn retained<T: ?Sized + Send + Sync + 'static>(
        &self,
        params: Params,
        owner: &RetainedOwner,
    ) -> Result<Holder<T>, StoreError> {
        let holder = self.container.holder_with::<T>(params)?;
        self.binder.bind_retained(&holder, owner);
        Ok(holder)
    }
}
