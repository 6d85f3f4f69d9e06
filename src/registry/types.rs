use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::component::ServiceContainer;
use crate::registry::errors::{RegistryError, RegistryResult};

const FINGERPRINT_BYTES: usize = 12;

/// Named options identifying which backend project or tenant a client talks to.
///
/// Two configurations are the same client when they hold the same key/value
/// pairs, regardless of how or where they were built. Values are treated as
/// secrets: `Debug` output and [`fingerprint`](Self::fingerprint) never expose them.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientConfiguration {
    options: BTreeMap<String, String>,
}

impl ClientConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this configuration with `key` set to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// A key is present when it maps to a non-blank value.
    pub fn is_present(&self, key: &str) -> bool {
        self.get(key).is_some_and(|value| !value.trim().is_empty())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// True when no key carries a non-blank value.
    pub fn is_empty(&self) -> bool {
        !self.options.values().any(|value| !value.trim().is_empty())
    }

    pub fn missing_keys(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|key| !self.is_present(key))
            .map(|key| (*key).to_string())
            .collect()
    }

    /// Short, stable digest of the key/value pairs, safe to print.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (key, value) in &self.options {
            hasher.update((key.len() as u64).to_be_bytes());
            hasher.update(key.as_bytes());
            hasher.update((value.len() as u64).to_be_bytes());
            hasher.update(value.as_bytes());
        }
        let digest = hasher.finalize();
        URL_SAFE_NO_PAD.encode(&digest[..FINGERPRINT_BYTES])
    }

    /// Parses a flat JSON object. Numbers and booleans are stored in their
    /// JSON text form; nulls are skipped; nested values are rejected.
    pub fn from_json_str(raw: &str) -> RegistryResult<Self> {
        let value: Value =
            serde_json::from_str(raw).map_err(|err| RegistryError::MalformedConfiguration {
                reason: err.to_string(),
            })?;
        let Value::Object(map) = value else {
            return Err(RegistryError::MalformedConfiguration {
                reason: "expected a JSON object".to_string(),
            });
        };

        let mut options = BTreeMap::new();
        for (key, value) in map {
            let text = match value {
                Value::String(text) => text,
                Value::Number(number) => number.to_string(),
                Value::Bool(flag) => flag.to_string(),
                Value::Null => continue,
                Value::Array(_) | Value::Object(_) => {
                    return Err(RegistryError::MalformedConfiguration {
                        reason: format!("option '{key}' must be a scalar value"),
                    });
                }
            };
            options.insert(key, text);
        }
        Ok(Self { options })
    }

    /// Collects every environment variable starting with `prefix`. The
    /// remainder of the variable name, lowercased, becomes the key, so
    /// `APP_API_KEY` with prefix `APP_` yields `api_key`.
    pub fn from_env_prefix(prefix: &str) -> Self {
        std::env::vars()
            .filter_map(|(name, value)| {
                let key = name.strip_prefix(prefix)?;
                if key.is_empty() {
                    return None;
                }
                Some((key.to_ascii_lowercase(), value))
            })
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for ClientConfiguration
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            options: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl fmt::Debug for ClientConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfiguration")
            .field("keys", &self.options.keys().collect::<Vec<_>>())
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// A published client: its configuration, the handle built for it and the
/// container holding services derived from that handle.
pub struct RegistryEntry<H> {
    inner: Arc<RegistryEntryInner<H>>,
}

struct RegistryEntryInner<H> {
    configuration: ClientConfiguration,
    fingerprint: String,
    handle: Arc<H>,
    services: ServiceContainer,
    created_at: DateTime<Utc>,
}

impl<H> RegistryEntry<H>
where
    H: Send + Sync + 'static,
{
    pub(crate) fn new(configuration: ClientConfiguration, handle: H) -> Self {
        let fingerprint = configuration.fingerprint();
        let handle = Arc::new(handle);
        let services = ServiceContainer::new(fingerprint.clone(), handle.clone());
        Self {
            inner: Arc::new(RegistryEntryInner {
                configuration,
                fingerprint,
                handle,
                services,
                created_at: Utc::now(),
            }),
        }
    }
}

impl<H> RegistryEntry<H> {
    pub fn configuration(&self) -> &ClientConfiguration {
        &self.inner.configuration
    }

    pub fn fingerprint(&self) -> &str {
        &self.inner.fingerprint
    }

    pub fn handle(&self) -> Arc<H> {
        Arc::clone(&self.inner.handle)
    }

    pub fn services(&self) -> ServiceContainer {
        self.inner.services.clone()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }
}

impl<H> Clone for RegistryEntry<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H> fmt::Debug for RegistryEntry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("fingerprint", &self.fingerprint())
            .field("created_at", &self.created_at())
            .finish()
    }
}
