use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::component::ComponentError;

pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug, Clone)]
pub enum RegistryError {
    /// The configuration is empty or lacks keys the factory requires.
    InvalidConfiguration { missing: Vec<String> },
    MalformedConfiguration { reason: String },
    /// The client factory failed; nothing was published for `client`.
    Factory { client: String, source: FactoryError },
    NoClient { client: String },
    ComponentFailure { component: String, message: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::InvalidConfiguration { missing } if missing.is_empty() => {
                write!(f, "Client configuration is empty")
            }
            RegistryError::InvalidConfiguration { missing } => write!(
                f,
                "Client configuration is missing required keys: {}",
                missing.join(", ")
            ),
            RegistryError::MalformedConfiguration { reason } => {
                write!(f, "Client configuration could not be parsed: {reason}")
            }
            RegistryError::Factory { client, source } => {
                write!(f, "Client '{client}' failed to initialize: {source}")
            }
            RegistryError::NoClient { client } => {
                write!(f, "No client '{client}' has been created - call get_or_create() first")
            }
            RegistryError::ComponentFailure { component, message } => {
                write!(f, "Component {component} error: {message}")
            }
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RegistryError::Factory { source, .. } => Some(source.get_ref()),
            _ => None,
        }
    }
}

impl From<ComponentError> for RegistryError {
    fn from(err: ComponentError) -> Self {
        match err {
            ComponentError::MismatchingComponent { expected, found } => {
                RegistryError::ComponentFailure {
                    component: found,
                    message: format!("does not satisfy provider for {expected}"),
                }
            }
            ComponentError::ComponentAlreadyProvided { name } => RegistryError::ComponentFailure {
                component: name,
                message: "component already provided".to_string(),
            },
            ComponentError::ComponentNotRegistered { name } => RegistryError::ComponentFailure {
                component: name,
                message: "component not registered".to_string(),
            },
            ComponentError::InitializationFailed { name, reason } => {
                RegistryError::ComponentFailure {
                    component: name,
                    message: reason,
                }
            }
            ComponentError::InstanceUnavailable { name } => RegistryError::ComponentFailure {
                component: name,
                message: "instance unavailable".to_string(),
            },
        }
    }
}

/// The error a client factory reported, kept intact so callers can inspect
/// or downcast it.
#[derive(Clone)]
pub struct FactoryError {
    inner: Arc<dyn Error + Send + Sync + 'static>,
}

impl FactoryError {
    pub fn new<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(error),
        }
    }

    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(MessageError(message.into()))
    }

    pub fn get_ref(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.inner.as_ref()
    }

    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: Error + 'static,
    {
        self.inner.downcast_ref::<E>()
    }
}

impl fmt::Display for FactoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl fmt::Debug for FactoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

#[derive(Debug)]
struct MessageError(String);

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for MessageError {}
