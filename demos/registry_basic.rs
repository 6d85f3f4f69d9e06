use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use client_registry::component::{Component, InstantiationMode, ServiceContainer};
use client_registry::logger::{set_log_level, LogLevel};
use client_registry::registry::{ClientFactory, RegistryResult};
use client_registry::{ClientConfiguration, ClientRegistry, FactoryError};

/// Stand-in for the handle a vendor SDK returns from its initialization call.
struct BackendApp {
    project_id: String,
}

struct AnalyticsHandle {
    measurement_id: String,
}

struct VendorInitializer {
    handshakes: AtomicUsize,
}

impl ClientFactory<BackendApp> for VendorInitializer {
    fn required_keys(&self) -> &[&'static str] {
        &["api_key", "project_id", "app_id"]
    }

    fn create(&self, configuration: &ClientConfiguration) -> Result<BackendApp, FactoryError> {
        self.handshakes.fetch_add(1, Ordering::SeqCst);
        Ok(BackendApp {
            project_id: configuration
                .get("project_id")
                .unwrap_or_default()
                .to_string(),
        })
    }
}

fn main() -> RegistryResult<()> {
    let _ = set_log_level(LogLevel::Debug);

    // Placeholder credentials; nothing is contacted.
    let config = ClientConfiguration::new()
        .with("api_key", "demo-api-key")
        .with("project_id", "demo-project")
        .with("app_id", "1:123:web:demo")
        .with("measurement_id", "G-DEMO");

    let registry = Arc::new(ClientRegistry::<BackendApp>::new());
    registry.register_component(
        Component::from_fn("analytics", |container: &ServiceContainer| {
            let measurement_id = container
                .root::<BackendApp>()
                .map(|app| format!("{}/G-DEMO", app.project_id))
                .unwrap_or_default();
            Ok(AnalyticsHandle { measurement_id })
        })
        .with_instantiation_mode(InstantiationMode::Eager),
    );

    let initializer = Arc::new(VendorInitializer {
        handshakes: AtomicUsize::new(0),
    });

    // Simulate several call sites asking for the app at the same time.
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let initializer = Arc::clone(&initializer);
            let config = config.clone();
            thread::spawn(move || registry.get_or_create(&config, initializer.as_ref()))
        })
        .collect();

    for worker in workers {
        let app = worker.join().expect("worker panicked")?;
        println!("call site got app for project '{}'", app.project_id);
    }

    let analytics = registry.service::<AnalyticsHandle>(&config, "analytics")?;
    println!("analytics measurement id: {}", analytics.measurement_id);
    println!(
        "vendor handshakes performed: {}",
        initializer.handshakes.load(Ordering::SeqCst)
    );
    println!("registered clients: {}", registry.len());

    Ok(())
}
