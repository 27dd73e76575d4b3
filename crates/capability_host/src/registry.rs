//! Capability registration and lazy, cached resolution.

use std::{
    any::Any,
    cell::RefCell,
    collections::HashMap,
    fmt,
    future::Future,
    marker::PhantomData,
    rc::Rc,
};

use futures::future::{LocalBoxFuture, Shared};
use futures::FutureExt;

use crate::{error::CapabilityError, platform::Platform};

type ErasedFactory = Rc<dyn Fn() -> LocalBoxFuture<'static, Rc<dyn Any>>>;
type TypedFactory<T> = Box<dyn Fn() -> LocalBoxFuture<'static, Rc<T>>>;
type SharedResolution = Shared<LocalBoxFuture<'static, Rc<dyn Any>>>;

/// Per-platform implementation factory table for one capability.
///
/// A factory may load its implementation asynchronously; whichever factory
/// the resolver selects is invoked at most once per process.
pub struct PlatformFactories<T: 'static> {
    entries: Vec<(Platform, TypedFactory<T>)>,
}

impl<T: 'static> Default for PlatformFactories<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> PlatformFactories<T> {
    /// Creates an empty factory table.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Declares the factory for `platform`, replacing an earlier entry for
    /// the same tag.
    pub fn with<F, Fut>(mut self, platform: Platform, factory: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Rc<T>> + 'static,
    {
        self.entries.retain(|(existing, _)| *existing != platform);
        self.entries
            .push((platform, Box::new(move || factory().boxed_local())));
        self
    }

    /// Declares the generic web factory used when no platform-specific
    /// entry matches.
    pub fn web<F, Fut>(self, factory: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Rc<T>> + 'static,
    {
        self.with(Platform::Web, factory)
    }

    fn erase(self) -> HashMap<Platform, ErasedFactory> {
        self.entries
            .into_iter()
            .map(|(platform, factory)| {
                let erased: ErasedFactory = Rc::new(move || {
                    let pending = factory();
                    let erased_future: LocalBoxFuture<'static, Rc<dyn Any>> =
                        Box::pin(async move {
                            let instance: Rc<dyn Any> = pending.await;
                            instance
                        });
                    erased_future
                });
                (platform, erased)
            })
            .collect()
    }
}

enum ResolutionState {
    Idle,
    Resolving(SharedResolution),
    Ready(Rc<dyn Any>),
}

struct CapabilityEntry {
    factories: HashMap<Platform, ErasedFactory>,
    state: RefCell<ResolutionState>,
}

impl CapabilityEntry {
    fn factory_for(&self, platform: Platform) -> Option<ErasedFactory> {
        self.factories
            .get(&platform)
            .or_else(|| self.factories.get(&Platform::Web))
            .cloned()
    }
}

struct RegistryInner {
    platform: Platform,
    entries: RefCell<HashMap<String, CapabilityEntry>>,
}

/// Process-wide map from capability name to its resolved implementation.
///
/// Registration declares per-platform factories once; resolution is lazy,
/// selects a factory with precedence exact platform match → generic web
/// factory, and caches the constructed instance for the process lifetime.
/// Concurrent resolutions of one capability share the same in-flight
/// construction, so at most one instance per capability ever exists.
#[derive(Clone)]
pub struct CapabilityRegistry {
    inner: Rc<RegistryInner>,
}

impl CapabilityRegistry {
    /// Creates an empty registry resolving for `platform`.
    pub fn new(platform: Platform) -> Self {
        Self {
            inner: Rc::new(RegistryInner {
                platform,
                entries: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Returns the platform this registry resolves for.
    pub fn platform(&self) -> Platform {
        self.inner.platform
    }

    /// Declares a capability once and returns its typed handle.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::AlreadyRegistered`] when `name` was
    /// claimed by an earlier registration.
    pub fn register<T: 'static>(
        &self,
        name: &str,
        factories: PlatformFactories<T>,
    ) -> Result<CapabilityHandle<T>, CapabilityError> {
        let mut entries = self.inner.entries.borrow_mut();
        if entries.contains_key(name) {
            return Err(CapabilityError::already_registered(name));
        }
        entries.insert(
            name.to_string(),
            CapabilityEntry {
                factories: factories.erase(),
                state: RefCell::new(ResolutionState::Idle),
            },
        );
        tracing::debug!(capability = name, "capability registered");
        Ok(CapabilityHandle {
            registry: self.clone(),
            name: name.to_string(),
            _marker: PhantomData,
        })
    }

    /// Resolves `name` to its type-erased implementation instance.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::NotRegistered`] when `name` is unknown or
    /// declares no factory usable on this registry's platform.
    pub async fn resolve_erased(&self, name: &str) -> Result<Rc<dyn Any>, CapabilityError> {
        let shared = {
            let entries = self.inner.entries.borrow();
            let entry = entries
                .get(name)
                .ok_or_else(|| CapabilityError::not_registered(name))?;
            let mut state = entry.state.borrow_mut();
            match &*state {
                ResolutionState::Ready(instance) => return Ok(instance.clone()),
                ResolutionState::Resolving(shared) => shared.clone(),
                ResolutionState::Idle => {
                    let factory = entry
                        .factory_for(self.inner.platform)
                        .ok_or_else(|| CapabilityError::not_registered(name))?;
                    tracing::debug!(
                        capability = name,
                        platform = self.inner.platform.as_str(),
                        "resolving capability"
                    );
                    let shared = factory().shared();
                    *state = ResolutionState::Resolving(shared.clone());
                    shared
                }
            }
        };

        let instance = shared.await;

        let entries = self.inner.entries.borrow();
        if let Some(entry) = entries.get(name) {
            let mut state = entry.state.borrow_mut();
            if !matches!(&*state, ResolutionState::Ready(_)) {
                *state = ResolutionState::Ready(instance.clone());
            }
        }
        Ok(instance)
    }
}

/// Typed front over one registered capability.
///
/// Handles are only produced by [`CapabilityRegistry::register`], which
/// binds the name to a single concrete implementation type.
pub struct CapabilityHandle<T: 'static> {
    registry: CapabilityRegistry,
    name: String,
    _marker: PhantomData<Rc<T>>,
}

impl<T: 'static> Clone for CapabilityHandle<T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: 'static> fmt::Debug for CapabilityHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityHandle")
            .field("name", &self.name)
            .finish()
    }
}

impl<T: 'static> CapabilityHandle<T> {
    /// Returns the capability name this handle resolves.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolves the capability to its cached implementation instance.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::NotRegistered`] when no factory is usable
    /// on the registry's platform.
    pub async fn resolve(&self) -> Result<Rc<T>, CapabilityError> {
        let erased = self.registry.resolve_erased(&self.name).await?;
        erased
            .downcast::<T>()
            .map_err(|_| CapabilityError::not_registered(&self.name))
    }
}

thread_local! {
    static SHARED_REGISTRY: CapabilityRegistry = CapabilityRegistry::new(Platform::detected());
}

/// Returns the process-wide registry for the detected platform.
pub fn shared_registry() -> CapabilityRegistry {
    SHARED_REGISTRY.with(|registry| registry.clone())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use futures::channel::oneshot;
    use futures::executor::{block_on, LocalPool};
    use futures::task::LocalSpawnExt;

    use super::*;

    #[derive(Debug)]
    struct Probe {
        label: &'static str,
    }

    fn counting_web_factories(
        constructions: &Rc<Cell<usize>>,
    ) -> PlatformFactories<Probe> {
        let constructions = constructions.clone();
        PlatformFactories::new().web(move || {
            constructions.set(constructions.get() + 1);
            async { Rc::new(Probe { label: "web" }) }
        })
    }

    #[test]
    fn resolve_constructs_once_and_caches() {
        let registry = CapabilityRegistry::new(Platform::Web);
        let constructions = Rc::new(Cell::new(0));
        let handle = registry
            .register("Probe", counting_web_factories(&constructions))
            .expect("register");

        let first = block_on(handle.resolve()).expect("first resolve");
        let second = block_on(handle.resolve()).expect("second resolve");
        assert_eq!(constructions.get(), 1);
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn concurrent_resolutions_share_one_in_flight_construction() {
        let registry = CapabilityRegistry::new(Platform::Web);
        let constructions = Rc::new(Cell::new(0));
        let (release, released) = oneshot::channel::<()>();
        let released = released.shared();

        let handle = registry
            .register("Probe", {
                let constructions = constructions.clone();
                PlatformFactories::new().web(move || {
                    constructions.set(constructions.get() + 1);
                    let released = released.clone();
                    async move {
                        let _ = released.await;
                        Rc::new(Probe { label: "web" })
                    }
                })
            })
            .expect("register");

        let results: Rc<RefCell<Vec<Rc<Probe>>>> = Rc::new(RefCell::new(Vec::new()));
        let mut pool = LocalPool::new();
        let spawner = pool.spawner();
        for _ in 0..2 {
            let handle = handle.clone();
            let results = results.clone();
            spawner
                .spawn_local(async move {
                    let instance = handle.resolve().await.expect("resolve");
                    results.borrow_mut().push(instance);
                })
                .expect("spawn");
        }

        pool.run_until_stalled();
        assert_eq!(constructions.get(), 1);
        assert!(results.borrow().is_empty());

        release.send(()).expect("release factory");
        pool.run();

        let results = results.borrow();
        assert_eq!(results.len(), 2);
        assert!(Rc::ptr_eq(&results[0], &results[1]));
        assert_eq!(constructions.get(), 1);
    }

    #[test]
    fn exact_platform_match_beats_web_fallback() {
        let registry = CapabilityRegistry::new(Platform::Ios);
        let handle = registry
            .register(
                "Probe",
                PlatformFactories::new()
                    .web(|| async { Rc::new(Probe { label: "web" }) })
                    .with(Platform::Ios, || async { Rc::new(Probe { label: "ios" }) }),
            )
            .expect("register");

        let instance = block_on(handle.resolve()).expect("resolve");
        assert_eq!(instance.label, "ios");
    }

    #[test]
    fn web_factory_backs_platforms_without_an_exact_match() {
        let registry = CapabilityRegistry::new(Platform::Android);
        let handle = registry
            .register(
                "Probe",
                PlatformFactories::new().web(|| async { Rc::new(Probe { label: "web" }) }),
            )
            .expect("register");

        let instance = block_on(handle.resolve()).expect("resolve");
        assert_eq!(instance.label, "web");
    }

    #[test]
    fn resolution_fails_without_a_usable_factory() {
        let registry = CapabilityRegistry::new(Platform::Android);
        let handle = registry
            .register(
                "Probe",
                PlatformFactories::<Probe>::new()
                    .with(Platform::Ios, || async { Rc::new(Probe { label: "ios" }) }),
            )
            .expect("register");

        let error = block_on(handle.resolve()).expect_err("expected failure");
        assert_eq!(
            error,
            CapabilityError::NotRegistered {
                name: "Probe".to_string()
            }
        );
    }

    #[test]
    fn unknown_names_fail_to_resolve() {
        let registry = CapabilityRegistry::new(Platform::Web);
        let error = block_on(registry.resolve_erased("Missing")).expect_err("expected failure");
        assert_eq!(
            error,
            CapabilityError::NotRegistered {
                name: "Missing".to_string()
            }
        );
    }

    #[test]
    fn re_registering_a_name_is_rejected() {
        let registry = CapabilityRegistry::new(Platform::Web);
        let constructions = Rc::new(Cell::new(0));
        registry
            .register("Probe", counting_web_factories(&constructions))
            .expect("first registration");

        let error = registry
            .register("Probe", counting_web_factories(&constructions))
            .expect_err("expected duplicate rejection");
        assert_eq!(
            error,
            CapabilityError::AlreadyRegistered {
                name: "Probe".to_string()
            }
        );
    }
}
