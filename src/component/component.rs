use std::any::Any;
use std::sync::Arc;

use crate::component::container::ServiceContainer;
use crate::component::types::{ComponentError, DynService, InstantiationMode, ServiceFactory};

/// Describes a service derived from a client handle, such as an auth or
/// analytics handle built on top of the initialized app.
#[derive(Clone)]
pub struct Component {
    name: Arc<str>,
    pub(crate) factory: ServiceFactory,
    pub(crate) instantiation_mode: InstantiationMode,
}

impl Component {
    pub fn new(name: impl Into<String>, factory: ServiceFactory) -> Self {
        Self {
            name: Arc::from(name.into()),
            factory,
            instantiation_mode: InstantiationMode::Lazy,
        }
    }

    /// Wraps a typed constructor; the built value is stored as a [`DynService`].
    pub fn from_fn<T, F>(name: impl Into<String>, build: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&ServiceContainer) -> Result<T, ComponentError> + Send + Sync + 'static,
    {
        let factory: ServiceFactory = Arc::new(move |container: &ServiceContainer| {
            build(container).map(|service| Arc::new(service) as DynService)
        });
        Self::new(name, factory)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instantiation_mode(&self) -> InstantiationMode {
        self.instantiation_mode
    }

    pub fn with_instantiation_mode(mut self, mode: InstantiationMode) -> Self {
        self.instantiation_mode = mode;
        self
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name())
            .field("instantiation_mode", &self.instantiation_mode)
            .finish()
    }
}
