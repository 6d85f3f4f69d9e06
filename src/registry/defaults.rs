use crate::registry::constants::DEFAULTS_ENV_VAR;
use crate::registry::logger::LOGGER;
use crate::registry::types::ClientConfiguration;

/// Reads the default client configuration from `CLIENT_REGISTRY_DEFAULTS`.
///
/// Returns `None` when the variable is unset, blank, holds an empty object or
/// cannot be parsed. Parse failures are logged at warn level.
pub fn default_configuration() -> Option<ClientConfiguration> {
    let raw = std::env::var(DEFAULTS_ENV_VAR).ok()?;
    parse_defaults(&raw)
}

pub(crate) fn parse_defaults(raw: &str) -> Option<ClientConfiguration> {
    if raw.trim().is_empty() {
        return None;
    }
    match ClientConfiguration::from_json_str(raw) {
        Ok(configuration) if configuration.is_empty() => None,
        Ok(configuration) => Some(configuration),
        Err(err) => {
            LOGGER.warn(format!("Ignoring {DEFAULTS_ENV_VAR}: {err}"));
            None
        }
    }
}
