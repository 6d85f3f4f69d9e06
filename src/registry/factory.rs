use std::future::Future;

use async_trait::async_trait;

use crate::registry::errors::FactoryError;
use crate::registry::types::ClientConfiguration;

/// Builds a client handle from a configuration, typically by calling into a
/// vendor SDK. Runs at most once per configuration per registry.
pub trait ClientFactory<H>: Send + Sync {
    /// Keys that must be present before [`create`](Self::create) is attempted.
    fn required_keys(&self) -> &[&'static str] {
        &[]
    }

    fn create(&self, configuration: &ClientConfiguration) -> Result<H, FactoryError>;
}

impl<H, F> ClientFactory<H> for F
where
    F: Fn(&ClientConfiguration) -> Result<H, FactoryError> + Send + Sync,
{
    fn create(&self, configuration: &ClientConfiguration) -> Result<H, FactoryError> {
        self(configuration)
    }
}

/// Asynchronous counterpart of [`ClientFactory`] for factories that perform
/// network setup.
#[async_trait]
pub trait AsyncClientFactory<H>: Send + Sync {
    fn required_keys(&self) -> &[&'static str] {
        &[]
    }

    async fn create(&self, configuration: &ClientConfiguration) -> Result<H, FactoryError>;
}

#[async_trait]
impl<H, F, Fut> AsyncClientFactory<H> for F
where
    H: Send + 'static,
    F: Fn(ClientConfiguration) -> Fut + Send + Sync,
    Fut: Future<Output = Result<H, FactoryError>> + Send + 'static,
{
    async fn create(&self, configuration: &ClientConfiguration) -> Result<H, FactoryError> {
        self(configuration.clone()).await
    }
}

/// A factory that declares which configuration keys it cannot do without.
pub struct RequiredKeys<F> {
    keys: Vec<&'static str>,
    factory: F,
}

pub fn with_required_keys<F>(keys: &[&'static str], factory: F) -> RequiredKeys<F> {
    RequiredKeys {
        keys: keys.to_vec(),
        factory,
    }
}

impl<F> RequiredKeys<F> {
    pub fn inner(&self) -> &F {
        &self.factory
    }
}

impl<H, F> ClientFactory<H> for RequiredKeys<F>
where
    F: ClientFactory<H>,
{
    fn required_keys(&self) -> &[&'static str] {
        &self.keys
    }

    fn create(&self, configuration: &ClientConfiguration) -> Result<H, FactoryError> {
        self.factory.create(configuration)
    }
}

#[async_trait]
impl<H, F> AsyncClientFactory<H> for RequiredKeys<F>
where
    H: Send + 'static,
    F: AsyncClientFactory<H>,
{
    fn required_keys(&self) -> &[&'static str] {
        &self.keys
    }

    async fn create(&self, configuration: &ClientConfiguration) -> Result<H, FactoryError> {
        self.factory.create(configuration).await
    }
}
