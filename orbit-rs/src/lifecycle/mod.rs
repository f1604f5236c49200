//! Lifecycle binding: scope-bound holders and holders retained by longer-lived owners.

pub mod binder;
pub mod retained;
pub mod source;

pub use binder::{Binding, LifecycleBinder};
pub use retained::{ConsumerId, LinkStats, RetainedLinks, RetainedOwner};
pub use source::{LifecycleObserver, LifecycleSource, ScopeId, ScopeLifecycle};
