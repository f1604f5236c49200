//! Orbit Rust facade: Application, Module trait and lifecycle binding on orbit-core.

pub mod core;
pub mod lifecycle;
pub mod solar;

pub use self::core::{Application, Module};
pub use lifecycle::{
    Binding, ConsumerId, LifecycleBinder, LifecycleObserver, LifecycleSource, LinkStats,
    RetainedLinks, RetainedOwner, ScopeId, ScopeLifecycle,
};
pub use orbit_core::{
    global, Alias, ClearHandle, Component, ComponentKey, Container, Holder, HolderId,
    Params, StoreConfig, StoreError, StoreStats, Unregistered, WeakContainer,
};
pub use orbit_rs_macros::Component;
