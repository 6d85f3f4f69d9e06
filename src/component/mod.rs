//! Services derived from a client handle.
//!
//! Every registry entry owns a [`ServiceContainer`] whose root is the client
//! handle. Components registered with the registry describe how to build
//! further handles from it; each one is built at most once per client.

mod component;
pub mod constants;
pub mod container;
mod logger;
pub mod provider;
pub mod types;

pub use component::Component;
pub use constants::LOGGER_NAME;
pub use container::ServiceContainer;
pub use provider::Provider;
pub use types::{ComponentError, DynService, InstantiationMode, ServiceFactory};

#[cfg(test)]
mod tests;
