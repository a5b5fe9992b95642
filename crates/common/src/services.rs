//! Typed service provider assembled once at boot.
//!
//! Services are keyed by their Rust type rather than a string token. A
//! singleton is shared by every caller; a transient is rebuilt on each
//! [`Services::resolve`]. Once [`ServicesBuilder::build`] runs the set is
//! frozen and can be read from any number of concurrent dispatches.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    sync::Arc,
};

use crate::{Error, Result};

type AnyArc = Arc<dyn Any + Send + Sync>;
type Factory = Arc<dyn Fn() -> AnyArc + Send + Sync>;

enum Scope {
    Singleton(AnyArc),
    Transient(Factory),
}

struct Entry {
    type_name: &'static str,
    scope: Scope,
}

/// Builder for [`Services`]; only available during boot.
#[derive(Default)]
pub struct ServicesBuilder {
    entries: HashMap<TypeId, Entry>,
}

impl ServicesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shared instance. Re-registering a type replaces it.
    #[must_use]
    pub fn singleton<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.entries.insert(TypeId::of::<T>(), Entry {
            type_name: std::any::type_name::<T>(),
            scope: Scope::Singleton(Arc::new(value)),
        });
        self
    }

    /// Register a factory producing a fresh instance per resolve.
    #[must_use]
    pub fn transient<T, F>(mut self, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.entries.insert(TypeId::of::<T>(), Entry {
            type_name: std::any::type_name::<T>(),
            scope: Scope::Transient(Arc::new(move || Arc::new(factory()) as AnyArc)),
        });
        self
    }

    pub fn build(self) -> Services {
        Services {
            entries: Arc::new(self.entries),
        }
    }
}

/// Frozen, cheaply cloneable service provider.
#[derive(Clone, Default)]
pub struct Services {
    entries: Arc<HashMap<TypeId, Entry>>,
}

impl Services {
    pub fn builder() -> ServicesBuilder {
        ServicesBuilder::new()
    }

    /// Resolve a service, returning `None` if the type was never registered.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let entry = self.entries.get(&TypeId::of::<T>())?;
        let value = match &entry.scope {
            Scope::Singleton(value) => Arc::clone(value),
            Scope::Transient(factory) => factory(),
        };
        value.downcast::<T>().ok()
    }

    /// Resolve a service that boot is expected to have provided.
    pub fn resolve<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        self.get::<T>().ok_or_else(Error::missing_service::<T>)
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.entries.values().map(|e| e.type_name).collect();
        names.sort_unstable();
        f.debug_struct("Services").field("types", &names).finish()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Debug, PartialEq)]
    struct Greeting(&'static str);

    #[test]
    fn singleton_is_shared() {
        let services = Services::builder().singleton(Greeting("hello")).build();
        let a = services.resolve::<Greeting>().unwrap();
        let b = services.resolve::<Greeting>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*a, Greeting("hello"));
    }

    #[test]
    fn transient_builds_each_time() {
        static BUILT: AtomicUsize = AtomicUsize::new(0);
        let services = Services::builder()
            .transient(|| {
                BUILT.fetch_add(1, Ordering::SeqCst);
                Greeting("fresh")
            })
            .build();
        let a = services.resolve::<Greeting>().unwrap();
        let b = services.resolve::<Greeting>().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(BUILT.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_service_is_an_error() {
        let services = Services::builder().build();
        assert!(services.get::<Greeting>().is_none());
        assert!(matches!(
            services.resolve::<Greeting>(),
            Err(Error::MissingService { .. })
        ));
    }

    #[test]
    fn clones_share_entries() {
        let services = Services::builder().singleton(5_u32).build();
        let clone = services.clone();
        assert!(clone.contains::<u32>());
        assert_eq!(clone.len(), 1);
        assert!(format!("{services:?}").contains("u32"));
    }
}
