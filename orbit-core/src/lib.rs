//! Orbit core: component registry, keyed instance cache, resolver, holders.
//!
//! One `Container` value owns the registrations and the live instances. Components are looked
//! up by type (or by an alias view such as `dyn Api`) plus optional `Params`; each
//! (type, params) pair has at most one live instance. Clearing an instance also clears every
//! instance that was constructed with it as parent.

mod cache;
pub mod config;
pub mod container;
pub mod holder;
pub mod key;
pub mod registry;
mod resolver;
#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use config::StoreConfig;
pub use container::{global, Container, Registration, ChildRegistration, StoreStats, WeakContainer};
pub use holder::{ClearHandle, Holder, HolderId};
pub use key::{ComponentKey, Params};
pub use registry::{Alias, Component};

use std::fmt;
use thiserror::Error;

/// Why a lookup found no provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unregistered {
    /// Neither a registered component nor an alias.
    NeverRegistered,
    /// The identifier is on the alias exclusion list, so it never maps to a component.
    ExcludedAlias,
}

impl fmt::Display for Unregistered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unregistered::NeverRegistered => f.write_str("it was never registered"),
            Unregistered::ExcludedAlias => f.write_str("it is an excluded alias"),
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("component {component} is already registered")]
    DuplicateRegistration { component: &'static str },
    #[error("alias {alias} of {component} is already registered for {existing}")]
    DuplicateAlias {
        alias: &'static str,
        component: &'static str,
        existing: &'static str,
    },
    #[error("no provider for {component}: {reason}")]
    UnregisteredComponent {
        component: &'static str,
        reason: Unregistered,
    },
    #[error("cyclic dependency: {}", .chain.join(" -> "))]
    CyclicDependency { chain: Vec<&'static str> },
    #[error("resolution depth {limit} exceeded: {}", .chain.join(" -> "))]
    DepthLimitExceeded {
        limit: usize,
        chain: Vec<&'static str>,
    },
    #[error("{component} expects params of type {expected}, got {actual}")]
    InvalidParams {
        component: &'static str,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("{requested} is not a view of the instance registered as {component}")]
    ViewMismatch {
        requested: &'static str,
        component: &'static str,
    },
    #[error("construction failed: {0}")]
    Construction(String),
    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
}
