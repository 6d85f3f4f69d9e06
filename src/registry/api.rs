use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use async_lock::OnceCell;

use crate::component::{Component, ComponentError};
use crate::registry::defaults::default_configuration;
use crate::registry::errors::{FactoryError, RegistryError, RegistryResult};
use crate::registry::factory::{AsyncClientFactory, ClientFactory};
use crate::registry::logger::LOGGER;
use crate::registry::types::{ClientConfiguration, RegistryEntry};

type Slot<H> = Arc<OnceCell<RegistryEntry<H>>>;

/// Holds at most one client handle per configuration.
///
/// The first successful [`get_or_create`](Self::get_or_create) for a
/// configuration runs the factory and publishes the handle; every later call,
/// including calls racing the first one, returns that same `Arc`. Failed
/// factory runs publish nothing, so the next call starts a fresh attempt.
///
/// Registries are ordinary values: construct one at startup and hand it to
/// the code that needs clients.
pub struct ClientRegistry<H> {
    slots: Mutex<HashMap<ClientConfiguration, Slot<H>>>,
    components: Mutex<HashMap<Arc<str>, Component>>,
}

impl<H> ClientRegistry<H>
where
    H: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            components: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the handle for `configuration`, building it with `factory` if
    /// no handle exists yet. Blocks while another thread builds the same client.
    pub fn get_or_create<F>(
        &self,
        configuration: &ClientConfiguration,
        factory: &F,
    ) -> RegistryResult<Arc<H>>
    where
        F: ClientFactory<H> + ?Sized,
    {
        validate(configuration, factory.required_keys())?;

        let slot = self.slot(configuration);
        if let Some(entry) = slot.get() {
            return Ok(reuse(entry));
        }

        let mut created = false;
        let initialized = slot
            .get_or_try_init_blocking(|| {
                created = true;
                build_entry(configuration, factory.create(configuration))
                    .inspect(|entry| self.declare_components(entry))
            })
            .cloned();
        let entry = match initialized {
            Ok(entry) => entry,
            Err(err) => {
                self.discard_unused(configuration, &slot);
                return Err(err);
            }
        };

        if created {
            self.publish(&entry);
        }
        Ok(entry.handle())
    }

    /// Async form of [`get_or_create`](Self::get_or_create). Concurrent
    /// callers for the same configuration wait for the one running the factory.
    pub async fn get_or_create_async<F>(
        &self,
        configuration: &ClientConfiguration,
        factory: &F,
    ) -> RegistryResult<Arc<H>>
    where
        F: AsyncClientFactory<H> + ?Sized,
    {
        validate(configuration, factory.required_keys())?;

        let slot = self.slot(configuration);
        if let Some(entry) = slot.get() {
            return Ok(reuse(entry));
        }

        let mut created = false;
        let initialized = slot
            .get_or_try_init(|| {
                created = true;
                async move {
                    build_entry(configuration, factory.create(configuration).await)
                        .inspect(|entry| self.declare_components(entry))
                }
            })
            .await
            .cloned();
        let entry = match initialized {
            Ok(entry) => entry,
            Err(err) => {
                self.discard_unused(configuration, &slot);
                return Err(err);
            }
        };

        if created {
            self.publish(&entry);
        }
        Ok(entry.handle())
    }

    /// Like [`get_or_create`](Self::get_or_create) with the configuration
    /// taken from `CLIENT_REGISTRY_DEFAULTS`.
    pub fn get_or_create_default<F>(&self, factory: &F) -> RegistryResult<Arc<H>>
    where
        F: ClientFactory<H> + ?Sized,
    {
        let configuration =
            default_configuration().ok_or_else(|| no_defaults(factory.required_keys()))?;
        self.get_or_create(&configuration, factory)
    }

    pub async fn get_or_create_default_async<F>(&self, factory: &F) -> RegistryResult<Arc<H>>
    where
        F: AsyncClientFactory<H> + ?Sized,
    {
        let configuration =
            default_configuration().ok_or_else(|| no_defaults(factory.required_keys()))?;
        self.get_or_create_async(&configuration, factory).await
    }

    /// The published handle for `configuration`, without creating one.
    pub fn get(&self, configuration: &ClientConfiguration) -> Option<Arc<H>> {
        self.entry(configuration).map(|entry| entry.handle())
    }

    pub fn entry(&self, configuration: &ClientConfiguration) -> Option<RegistryEntry<H>> {
        self.slots()
            .get(configuration)
            .and_then(|slot| slot.get().cloned())
    }

    /// Every published entry, in no particular order.
    pub fn entries(&self) -> Vec<RegistryEntry<H>> {
        self.slots()
            .values()
            .filter_map(|slot| slot.get().cloned())
            .collect()
    }

    pub fn contains(&self, configuration: &ClientConfiguration) -> bool {
        self.entry(configuration).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots()
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registers a derived service for every client, present and future.
    /// Returns `false` if a component with the same name is already registered.
    pub fn register_component(&self, component: Component) -> bool {
        {
            let mut components = self.components();
            if components.contains_key(component.name()) {
                return false;
            }
            components.insert(Arc::from(component.name()), component.clone());
        }

        for entry in self.entries() {
            attach(&entry, component.clone());
        }
        true
    }

    /// Fetches (building on first use) the named service of a published client.
    pub fn service<T>(&self, configuration: &ClientConfiguration, name: &str) -> RegistryResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let entry = self
            .entry(configuration)
            .ok_or_else(|| RegistryError::NoClient {
                client: configuration.fingerprint(),
            })?;
        entry
            .services()
            .get_provider(name)
            .get::<T>()
            .map_err(RegistryError::from)
    }

    fn slot(&self, configuration: &ClientConfiguration) -> Slot<H> {
        let mut slots = self.slots();
        if let Some(slot) = slots.get(configuration) {
            return Arc::clone(slot);
        }
        let slot: Slot<H> = Arc::new(OnceCell::new());
        slots.insert(configuration.clone(), Arc::clone(&slot));
        slot
    }

    // Runs before the slot is set, so callers that find the entry already see
    // every component registered up to this point. Eager ones are built in
    // publish.
    fn declare_components(&self, entry: &RegistryEntry<H>) {
        let services = entry.services();
        for component in self.registered_components() {
            let name = component.name().to_string();
            if let Err(err) = services.provide_component(component) {
                LOGGER.debug(format!(
                    "Component {name} failed to register with client {}: {err}",
                    entry.fingerprint()
                ));
            }
        }
    }

    // Runs after the slot is set so that a concurrent register_component
    // either sees the entry or is seen here.
    fn publish(&self, entry: &RegistryEntry<H>) {
        for component in self.registered_components() {
            attach(entry, component);
        }
        entry.services().initialize_eager();
        LOGGER.info(format!("Initialized client {}", entry.fingerprint()));
    }

    // A failed slot is dropped unless another caller still holds it and is
    // about to retry on it. Clones are only handed out under the map lock.
    fn discard_unused(&self, configuration: &ClientConfiguration, slot: &Slot<H>) {
        let mut slots = self.slots();
        let unused = slot.get().is_none()
            && Arc::strong_count(slot) == 2
            && slots
                .get(configuration)
                .is_some_and(|current| Arc::ptr_eq(current, slot));
        if unused {
            slots.remove(configuration);
        }
    }

    fn registered_components(&self) -> Vec<Component> {
        self.components().values().cloned().collect()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<ClientConfiguration, Slot<H>>> {
        self.slots.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    fn components(&self) -> MutexGuard<'_, HashMap<Arc<str>, Component>> {
        self.components
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl<H> Default for ClientRegistry<H>
where
    H: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for ClientRegistry<H>
where
    H: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("clients", &self.len())
            .field("components", &self.components().len())
            .finish()
    }
}

fn validate(configuration: &ClientConfiguration, required: &[&str]) -> RegistryResult<()> {
    if configuration.is_empty() {
        return Err(RegistryError::InvalidConfiguration { missing: Vec::new() });
    }
    let missing = configuration.missing_keys(required);
    if !missing.is_empty() {
        return Err(RegistryError::InvalidConfiguration { missing });
    }
    Ok(())
}

fn no_defaults(required: &[&str]) -> RegistryError {
    LOGGER.debug("No default client configuration available");
    RegistryError::InvalidConfiguration {
        missing: required.iter().map(|key| (*key).to_string()).collect(),
    }
}

fn reuse<H>(entry: &RegistryEntry<H>) -> Arc<H> {
    LOGGER.debug(format!("Reusing client {}", entry.fingerprint()));
    entry.handle()
}

fn build_entry<H>(
    configuration: &ClientConfiguration,
    created: Result<H, FactoryError>,
) -> RegistryResult<RegistryEntry<H>>
where
    H: Send + Sync + 'static,
{
    match created {
        Ok(handle) => Ok(RegistryEntry::new(configuration.clone(), handle)),
        Err(source) => {
            let client = configuration.fingerprint();
            LOGGER.warn(format!("Client {client} failed to initialize: {source}"));
            Err(RegistryError::Factory { client, source })
        }
    }
}

fn attach<H>(entry: &RegistryEntry<H>, component: Component) {
    let name = component.name().to_string();
    match entry.services().add_component(component) {
        Ok(()) | Err(ComponentError::ComponentAlreadyProvided { .. }) => {}
        Err(err) => LOGGER.debug(format!(
            "Component {name} failed to register with client {}: {err}",
            entry.fingerprint()
        )),
    }
}
