use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::component::container::ServiceContainer;

pub type DynService = Arc<dyn Any + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstantiationMode {
    /// Built on first request.
    Lazy,
    /// Built as soon as the component is attached to a client.
    Eager,
}

pub type ServiceFactory =
    Arc<dyn Fn(&ServiceContainer) -> Result<DynService, ComponentError> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    MismatchingComponent { expected: String, found: String },
    ComponentAlreadyProvided { name: String },
    ComponentNotRegistered { name: String },
    InitializationFailed { name: String, reason: String },
    InstanceUnavailable { name: String },
}

impl fmt::Display for ComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentError::MismatchingComponent { expected, found } => {
                write!(f, "Component {found} cannot satisfy provider for {expected}")
            }
            ComponentError::ComponentAlreadyProvided { name } => {
                write!(f, "Component {name} has already been registered")
            }
            ComponentError::ComponentNotRegistered { name } => {
                write!(f, "Component {name} has not been registered yet")
            }
            ComponentError::InitializationFailed { name, reason } => {
                write!(f, "Component {name} failed to initialize: {reason}")
            }
            ComponentError::InstanceUnavailable { name } => {
                write!(f, "Service {name} is not available")
            }
        }
    }
}

impl std::error::Error for ComponentError {}
