//! Lookup keys: component type identity and the params value that tells instances apart.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of a component type or alias view. Built from `TypeId`, so it never collides;
/// the type name is kept for errors and logs only.
#[derive(Clone, Copy)]
pub struct ComponentKey {
    id: TypeId,
    name: &'static str,
}

impl ComponentKey {
    /// Key for a concrete type (`ComponentKey::of::<Repo>()`) or a view (`ComponentKey::of::<dyn Api>()`).
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ComponentKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentKey {}

impl Hash for ComponentKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Object-safe equality and hashing for any params value.
trait ParamValue: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn ParamValue) -> bool;
    fn dyn_hash(&self, state: &mut dyn Hasher);
    fn type_name(&self) -> &'static str;
}

impl<T> ParamValue for T
where
    T: Any + Eq + Hash + fmt::Debug + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn ParamValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Params passed at lookup time and threaded into the factory. Secondary cache key:
/// compared by value, and the absent value is a key of its own.
#[derive(Clone, Default)]
pub struct Params(Option<Arc<dyn ParamValue>>);

impl Params {
    /// Absent params.
    pub fn none() -> Self {
        Self(None)
    }

    pub fn new<T>(value: T) -> Self
    where
        T: Eq + Hash + fmt::Debug + Send + Sync + 'static,
    {
        Self(Some(Arc::new(value)))
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    /// Typed access; `None` when absent or of another type.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.0.as_ref().and_then(|v| v.as_any().downcast_ref::<T>())
    }

    /// Type name of the held value, `"()"` when absent.
    pub fn type_name(&self) -> &'static str {
        self.0.as_ref().map_or("()", |v| v.type_name())
    }
}

impl PartialEq for Params {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => a.dyn_eq(b.as_ref()),
            _ => false,
        }
    }
}

impl Eq for Params {}

impl Hash for Params {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.0 {
            None => 0u8.hash(state),
            Some(v) => {
                1u8.hash(state);
                v.dyn_hash(state);
            }
        }
    }
}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            None => f.write_str("None"),
            Some(v) => fmt::Debug::fmt(v.as_ref(), f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    trait Api {}

    #[test]
    fn keys_compare_by_type() {
        assert_eq!(ComponentKey::of::<String>(), ComponentKey::of::<String>());
        assert_ne!(ComponentKey::of::<String>(), ComponentKey::of::<u32>());
        assert_ne!(ComponentKey::of::<dyn Api>(), ComponentKey::of::<String>());
        assert!(ComponentKey::of::<dyn Api>().name().contains("Api"));
    }

    #[test]
    fn params_compare_by_value_and_type() {
        assert_eq!(Params::new("1"), Params::new("1"));
        assert_ne!(Params::new("1"), Params::new("2"));
        assert_ne!(Params::new(1u32), Params::new(1u64));
        assert_ne!(Params::none(), Params::new(0u8));
        assert_eq!(Params::none(), Params::default());

        let set: HashSet<Params> = [Params::new(3usize), Params::new(3usize), Params::none()]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn params_typed_access() {
        let p = Params::new(String::from("earth"));
        assert_eq!(p.get::<String>().map(String::as_str), Some("earth"));
        assert!(p.get::<u32>().is_none());
        assert!(Params::none().get::<String>().is_none());
        assert_eq!(format!("{:?}", p), "\"earth\"");
    }
}
