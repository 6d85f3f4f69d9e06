#![doc = include_str!("RUSTDOC.md")]

pub mod component;
pub mod logger;
pub mod registry;

pub use registry::{
    ClientConfiguration, ClientRegistry, FactoryError, RegistryEntry, RegistryError,
    RegistryResult,
};

#[cfg(test)]
pub mod test_support;
