use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::component::provider::Provider;
use crate::component::types::{ComponentError, DynService};
use crate::component::Component;

/// Per-client set of providers. The root service is the client handle the
/// container was created for.
#[derive(Clone)]
pub struct ServiceContainer {
    pub(crate) inner: Arc<ServiceContainerInner>,
}

pub(crate) struct ServiceContainerInner {
    pub name: Arc<str>,
    pub providers: Mutex<HashMap<Arc<str>, Provider>>,
    pub root_service: DynService,
}

impl ServiceContainer {
    pub fn new<T>(name: impl Into<String>, root: Arc<T>) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            inner: Arc::new(ServiceContainerInner {
                name: Arc::from(name.into()),
                providers: Mutex::new(HashMap::new()),
                root_service: root as DynService,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The client handle, if it is a `T`.
    pub fn root<T>(&self) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        Arc::clone(&self.inner.root_service).downcast::<T>().ok()
    }

    pub fn add_component(&self, component: Component) -> Result<(), ComponentError> {
        self.get_provider(component.name()).set_component(component)
    }

    /// Registers a component without running eager initialization; see
    /// [`initialize_eager`](Self::initialize_eager).
    pub(crate) fn provide_component(&self, component: Component) -> Result<(), ComponentError> {
        self.get_provider(component.name()).provide(component)
    }

    /// Builds every eager component that has not been built yet.
    pub(crate) fn initialize_eager(&self) {
        for provider in self.get_providers() {
            provider.initialize_if_eager();
        }
    }

    pub fn get_provider(&self, name: &str) -> Provider {
        self.providers()
            .entry(Arc::from(name))
            .or_insert_with(|| Provider::new(name, self))
            .clone()
    }

    pub fn get_providers(&self) -> Vec<Provider> {
        self.providers().values().cloned().collect()
    }

    fn providers(&self) -> MutexGuard<'_, HashMap<Arc<str>, Provider>> {
        self.inner
            .providers
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl std::fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("name", &self.name())
            .field("providers", &self.get_providers().len())
            .finish()
    }
}
