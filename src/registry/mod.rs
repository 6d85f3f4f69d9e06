//! The client registry: idempotent, race-free initialization of shared client handles.
mod api;
mod constants;
mod defaults;
mod errors;
mod factory;
mod logger;
mod types;

#[doc(inline)]
pub use api::ClientRegistry;

#[doc(inline)]
pub use constants::{DEFAULTS_ENV_VAR, LOGGER_NAME};

#[doc(inline)]
pub use defaults::default_configuration;

#[doc(inline)]
pub use errors::{FactoryError, RegistryError, RegistryResult};

#[doc(inline)]
pub use factory::{with_required_keys, AsyncClientFactory, ClientFactory, RequiredKeys};

#[doc(inline)]
pub use logger::LOGGER;

#[doc(inline)]
pub use types::{ClientConfiguration, RegistryEntry};
