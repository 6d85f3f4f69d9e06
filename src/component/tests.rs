use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use crate::component::types::{DynService, ServiceFactory};
use crate::component::{
    Component, ComponentError, InstantiationMode, ServiceContainer, LOGGER_NAME,
};
use crate::logger::{set_user_log_handler_fn, LogCallbackParams, LogLevel, TEST_GUARD};

#[derive(Debug, PartialEq)]
struct App {
    project_id: String,
}

#[derive(Debug)]
struct Analytics {
    project_id: String,
}

fn container() -> ServiceContainer {
    ServiceContainer::new(
        "test-client",
        Arc::new(App {
            project_id: "demo".into(),
        }),
    )
}

fn analytics_component(counter: Arc<AtomicUsize>) -> Component {
    Component::from_fn("analytics", move |container: &ServiceContainer| {
        counter.fetch_add(1, Ordering::SeqCst);
        let app = container
            .root::<App>()
            .ok_or_else(|| ComponentError::InstanceUnavailable { name: "app".into() })?;
        Ok(Analytics {
            project_id: app.project_id.clone(),
        })
    })
}

#[test]
fn set_component_rejects_mismatched_name() {
    let container = container();
    let provider = container.get_provider("analytics");
    let factory: ServiceFactory = Arc::new(|_: &ServiceContainer| Ok(Arc::new(()) as DynService));
    assert!(matches!(
        provider.set_component(Component::new("auth", factory)),
        Err(ComponentError::MismatchingComponent { .. })
    ));
}

#[test]
fn second_component_with_same_name_is_rejected() {
    let container = container();
    let counter = Arc::new(AtomicUsize::new(0));
    container
        .add_component(analytics_component(counter.clone()))
        .expect("first registration");
    assert!(matches!(
        container.add_component(analytics_component(counter)),
        Err(ComponentError::ComponentAlreadyProvided { .. })
    ));
}

#[test]
fn lazy_component_builds_once_from_root_handle() {
    let container = container();
    let counter = Arc::new(AtomicUsize::new(0));
    container
        .add_component(analytics_component(counter.clone()))
        .unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    let provider = container.get_provider("analytics");
    let first = provider.get::<Analytics>().expect("analytics");
    let second = container
        .get_provider("analytics")
        .get_immediate::<Analytics>()
        .expect("cached analytics");

    assert_eq!(first.project_id, "demo");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn eager_component_initializes_on_attach() {
    let container = container();
    let counter = Arc::new(AtomicUsize::new(0));
    container
        .add_component(
            analytics_component(counter.clone()).with_instantiation_mode(InstantiationMode::Eager),
        )
        .unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(container.get_provider("analytics").is_initialized());
}

#[test]
fn unregistered_provider_reports_missing_component() {
    let container = container();
    let provider = container.get_provider("database");
    assert!(!provider.is_component_set());
    assert!(matches!(
        provider.get::<()>(),
        Err(ComponentError::ComponentNotRegistered { .. })
    ));
    assert!(provider.get_immediate::<()>().is_none());
}

#[test]
fn wrong_type_is_unavailable() {
    let container = container();
    container
        .add_component(analytics_component(Arc::new(AtomicUsize::new(0))))
        .unwrap();
    assert!(matches!(
        container.get_provider("analytics").get::<String>(),
        Err(ComponentError::InstanceUnavailable { .. })
    ));
}

#[test]
fn failed_build_is_retried() {
    let container = container();
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_in_factory = attempts.clone();
    container
        .add_component(Component::from_fn("auth", move |_: &ServiceContainer| {
            if attempts_in_factory.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ComponentError::InitializationFailed {
                    name: "auth".into(),
                    reason: "token endpoint unreachable".into(),
                })
            } else {
                Ok(String::from("auth-handle"))
            }
        }))
        .unwrap();

    let provider = container.get_provider("auth");
    assert!(matches!(
        provider.get::<String>(),
        Err(ComponentError::InitializationFailed { ref reason, .. })
            if reason == "token endpoint unreachable"
    ));
    assert!(!provider.is_initialized());
    assert_eq!(*provider.get::<String>().unwrap(), "auth-handle");
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn concurrent_first_use_builds_once() {
    let container = container();
    let counter = Arc::new(AtomicUsize::new(0));
    let counter_in_factory = counter.clone();
    container
        .add_component(Component::from_fn("database", move |_: &ServiceContainer| {
            counter_in_factory.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            Ok(String::from("db-handle"))
        }))
        .unwrap();

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let container = container.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                container.get_provider("database").get::<String>().unwrap()
            })
        })
        .collect();

    let services: Vec<Arc<String>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(services.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
}

#[test]
fn eager_failure_reaches_user_log_handler() {
    let _guard = TEST_GUARD.lock().unwrap_or_else(|poison| poison.into_inner());
    let records = Arc::new(Mutex::new(Vec::new()));
    let sink = records.clone();
    set_user_log_handler_fn(
        Some(move |params: LogCallbackParams| {
            if params.logger_type == LOGGER_NAME {
                sink.lock().unwrap().push((params.level, params.message));
            }
        }),
        None,
    );

    let container = container();
    let result = container.add_component(
        Component::from_fn("remote_config", |_: &ServiceContainer| {
            Err::<(), _>(ComponentError::InitializationFailed {
                name: "remote_config".into(),
                reason: "fetch refused".into(),
            })
        })
        .with_instantiation_mode(InstantiationMode::Eager),
    );
    set_user_log_handler_fn(None::<fn(LogCallbackParams)>, None);

    assert!(result.is_ok());
    assert!(!container.get_provider("remote_config").is_initialized());
    let records = records.lock().unwrap();
    assert!(records.iter().any(|(level, message)| *level == LogLevel::Warn
        && message.starts_with("Eager component remote_config failed to initialize")
        && message.contains("fetch refused")));
}
