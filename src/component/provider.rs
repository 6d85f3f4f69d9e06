use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use async_lock::OnceCell;

use crate::component::component::Component;
use crate::component::container::{ServiceContainer, ServiceContainerInner};
use crate::component::logger::LOGGER;
use crate::component::types::{ComponentError, DynService, InstantiationMode};

/// Lazily builds and caches the single instance of one named service.
#[derive(Clone)]
pub struct Provider {
    inner: Arc<ProviderInner>,
}

struct ProviderInner {
    name: Arc<str>,
    container: Weak<ServiceContainerInner>,
    component: Mutex<Option<Component>>,
    instance: OnceCell<DynService>,
}

impl Provider {
    pub(crate) fn new(name: &str, container: &ServiceContainer) -> Self {
        Self {
            inner: Arc::new(ProviderInner {
                name: Arc::from(name),
                container: Arc::downgrade(&container.inner),
                component: Mutex::new(None),
                instance: OnceCell::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn is_component_set(&self) -> bool {
        self.component().is_some()
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.instance.get().is_some()
    }

    pub fn set_component(&self, component: Component) -> Result<(), ComponentError> {
        self.provide(component)?;
        self.initialize_if_eager();
        Ok(())
    }

    /// Stores the component without building anything, even for eager ones.
    pub(crate) fn provide(&self, component: Component) -> Result<(), ComponentError> {
        if component.name() != self.name() {
            return Err(ComponentError::MismatchingComponent {
                expected: self.name().to_string(),
                found: component.name().to_string(),
            });
        }

        let mut guard = self.component();
        if guard.is_some() {
            return Err(ComponentError::ComponentAlreadyProvided {
                name: self.name().to_string(),
            });
        }
        *guard = Some(component);
        Ok(())
    }

    pub(crate) fn initialize_if_eager(&self) {
        let eager = self
            .component()
            .as_ref()
            .is_some_and(|component| component.instantiation_mode() == InstantiationMode::Eager);
        if !eager || self.is_initialized() {
            return;
        }
        if let Err(err) = self.instance() {
            LOGGER.warn(format!(
                "Eager component {} failed to initialize: {err}",
                self.name()
            ));
        }
    }

    /// Returns the service, building it on first use. Concurrent first calls
    /// build it once; a failed build is not cached.
    pub fn get<T>(&self) -> Result<Arc<T>, ComponentError>
    where
        T: Any + Send + Sync,
    {
        self.instance()?
            .downcast::<T>()
            .map_err(|_| ComponentError::InstanceUnavailable {
                name: self.name().to_string(),
            })
    }

    pub fn get_immediate<T>(&self) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.get::<T>().ok()
    }

    fn instance(&self) -> Result<DynService, ComponentError> {
        self.inner
            .instance
            .get_or_try_init_blocking(|| self.build())
            .cloned()
    }

    fn build(&self) -> Result<DynService, ComponentError> {
        let component =
            self.component()
                .clone()
                .ok_or_else(|| ComponentError::ComponentNotRegistered {
                    name: self.name().to_string(),
                })?;

        let container = match self.inner.container.upgrade() {
            Some(inner) => ServiceContainer { inner },
            None => {
                return Err(ComponentError::InitializationFailed {
                    name: self.name().to_string(),
                    reason: "container dropped".into(),
                });
            }
        };

        let instance = (component.factory)(&container).map_err(|err| match err {
            err @ ComponentError::InitializationFailed { .. } => err,
            other => ComponentError::InitializationFailed {
                name: self.name().to_string(),
                reason: other.to_string(),
            },
        })?;
        LOGGER.debug(format!(
            "Service {} created for client {}",
            self.name(),
            container.name()
        ));
        Ok(instance)
    }

    fn component(&self) -> MutexGuard<'_, Option<Component>> {
        self.inner
            .component
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
