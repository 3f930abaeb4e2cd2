//! Minimalistic, type-safe service hub.
//!
//! Startups register implementations during `configure_services`; consumers
//! fetch by *interface type* (trait object) without knowing who provided it.
//!
//! Implementation details:
//! - Key = type name. We use `type_name::<T>()`, which works for `T = dyn Trait`.
//! - Value = `Arc<T>` stored as `Box<dyn Any + Send + Sync>` (downcast on read).
//! - Sync hot path: `get()` takes a read lock, no hidden lazy slots.
//! - Re-registering overwrites atomically; `Arc`s already handed out stay valid.
//! - `remove` and `clear` exist mainly for tests.

use parking_lot::RwLock;
use std::{any::Any, collections::HashMap, fmt, sync::Arc};

/// Stable type key for trait objects, from fully-qualified `type_name::<T>()`.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct TypeKey(&'static str);

impl TypeKey {
    #[inline]
    fn of<T: ?Sized + 'static>() -> Self {
        TypeKey(std::any::type_name::<T>())
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceHubError {
    #[error("service not found: type={type_key:?}")]
    NotFound { type_key: TypeKey },

    #[error("type mismatch in hub for type={type_key:?}")]
    TypeMismatch { type_key: TypeKey },
}

type Boxed = Box<dyn Any + Send + Sync>;

/// Type-keyed registry of services shared by discovered startups.
#[derive(Default)]
pub struct ServiceHub {
    map: RwLock<HashMap<TypeKey, Boxed>>,
}

impl ServiceHub {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service under the interface type `T`.
    /// `T` can be a trait object like `dyn node_status::NodeStatusApi`.
    pub fn register<T>(&self, service: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let mut w = self.map.write();
        w.insert(TypeKey::of::<T>(), Box::new(service));
    }

    /// Fetches a service by interface type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceHubError::NotFound`] if nothing is registered under
    /// `T`, or [`ServiceHubError::TypeMismatch`] if the stored value is not
    /// an `Arc<T>`.
    pub fn get<T>(&self) -> Result<Arc<T>, ServiceHubError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let type_key = TypeKey::of::<T>();
        let r = self.map.read();

        let boxed = r.get(&type_key).ok_or(ServiceHubError::NotFound {
            type_key: type_key.clone(),
        })?;

        // Stored value is exactly `Arc<T>`; downcast is cheap.
        if let Some(arc_t) = boxed.downcast_ref::<Arc<T>>() {
            return Ok(arc_t.clone());
        }
        Err(ServiceHubError::TypeMismatch { type_key })
    }

    /// Removes a service; returns it if it was present.
    pub fn remove<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let boxed = self.map.write().remove(&TypeKey::of::<T>())?;
        boxed.downcast::<Arc<T>>().ok().map(|b| *b)
    }

    /// Clears everything (useful in tests).
    pub fn clear(&self) {
        self.map.write().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    trait TestApi: Send + Sync {
        fn id(&self) -> usize;
    }

    struct ImplA(usize);
    impl TestApi for ImplA {
        fn id(&self) -> usize {
            self.0
        }
    }

    #[test]
    fn register_and_get_dyn_trait() {
        let hub = ServiceHub::new();
        let api: Arc<dyn TestApi> = Arc::new(ImplA(7));
        hub.register::<dyn TestApi>(api.clone());

        let got = hub.get::<dyn TestApi>().unwrap();
        assert_eq!(got.id(), 7);
        assert_eq!(Arc::as_ptr(&api), Arc::as_ptr(&got));
    }

    #[test]
    fn re_registering_overwrites_previous_service() {
        let hub = ServiceHub::new();
        hub.register::<dyn TestApi>(Arc::new(ImplA(10)));
        hub.register::<dyn TestApi>(Arc::new(ImplA(20)));

        assert_eq!(hub.get::<dyn TestApi>().unwrap().id(), 20);
        assert_eq!(hub.len(), 1);
    }

    #[test]
    fn existing_arcs_remain_valid_after_re_registration() {
        let hub = ServiceHub::new();
        hub.register::<dyn TestApi>(Arc::new(ImplA(100)));
        let first = hub.get::<dyn TestApi>().unwrap();

        hub.register::<dyn TestApi>(Arc::new(ImplA(200)));

        assert_eq!(first.id(), 100, "original Arc retains its value");
        assert_eq!(hub.get::<dyn TestApi>().unwrap().id(), 200);
    }

    #[test]
    fn get_returns_not_found_for_unregistered_service() {
        let hub = ServiceHub::new();
        let result = hub.get::<dyn TestApi>();
        match result {
            Err(ServiceHubError::NotFound { type_key }) => {
                assert!(format!("{type_key:?}").contains("TestApi"));
            }
            _ => panic!("expected NotFound"),
        }
    }

    #[test]
    fn remove_returns_service_and_makes_it_unavailable() {
        let hub = ServiceHub::new();
        hub.register::<dyn TestApi>(Arc::new(ImplA(42)));

        let removed = hub.remove::<dyn TestApi>();
        assert_eq!(removed.unwrap().id(), 42);
        assert!(hub.get::<dyn TestApi>().is_err());
    }

    #[test]
    fn distinct_trait_types_coexist() {
        trait OtherApi: Send + Sync {
            fn name(&self) -> &'static str;
        }
        struct ImplB;
        impl OtherApi for ImplB {
            fn name(&self) -> &'static str {
                "other"
            }
        }

        let hub = ServiceHub::new();
        hub.register::<dyn TestApi>(Arc::new(ImplA(1)));
        hub.register::<dyn OtherApi>(Arc::new(ImplB));

        assert_eq!(hub.get::<dyn TestApi>().unwrap().id(), 1);
        assert_eq!(hub.get::<dyn OtherApi>().unwrap().name(), "other");
        assert_eq!(hub.len(), 2);
    }

    #[test]
    fn clear_removes_all_services() {
        let hub = ServiceHub::new();
        hub.register::<dyn TestApi>(Arc::new(ImplA(1)));
        assert!(!hub.is_empty());

        hub.clear();
        assert!(hub.is_empty());
        assert!(hub.get::<dyn TestApi>().is_err());
    }
}
