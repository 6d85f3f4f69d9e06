//! Test utilities shared across crate-level unit tests.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::registry::{AsyncClientFactory, ClientConfiguration, ClientFactory, FactoryError};

pub const TEST_API_KEY: &str = "test-api-key";

/// Stand-in for a vendor SDK app handle.
#[derive(Debug, PartialEq, Eq)]
pub struct TestClient {
    pub project_id: String,
    pub serial: usize,
}

/// A configuration carrying the keys [`CountingFactory`] requires.
pub fn test_configuration(project_id: &str) -> ClientConfiguration {
    ClientConfiguration::new()
        .with("api_key", TEST_API_KEY)
        .with("project_id", project_id)
        .with("app_id", format!("1:123:web:{project_id}"))
}

/// Factory that records how often it ran and can be told to fail or stall.
#[derive(Default)]
pub struct CountingFactory {
    calls: AtomicUsize,
    failures_left: AtomicUsize,
    delay: Duration,
}

impl CountingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first `failures` calls return a connection-refused error.
    pub fn failing_first(failures: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(failures),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn finish(
        &self,
        configuration: &ClientConfiguration,
        serial: usize,
    ) -> Result<TestClient, FactoryError> {
        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(FactoryError::new(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "backend unreachable",
            )));
        }
        Ok(TestClient {
            project_id: configuration.get("project_id").unwrap_or_default().to_string(),
            serial,
        })
    }
}

impl ClientFactory<TestClient> for CountingFactory {
    fn required_keys(&self) -> &[&'static str] {
        &["api_key", "project_id"]
    }

    fn create(&self, configuration: &ClientConfiguration) -> Result<TestClient, FactoryError> {
        let serial = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.finish(configuration, serial)
    }
}

#[async_trait]
impl AsyncClientFactory<TestClient> for CountingFactory {
    fn required_keys(&self) -> &[&'static str] {
        &["api_key", "project_id"]
    }

    async fn create(&self, configuration: &ClientConfiguration) -> Result<TestClient, FactoryError> {
        let serial = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.finish(configuration, serial)
    }
}
