/// Environment variable holding the default client configuration as a flat JSON object.
pub const DEFAULTS_ENV_VAR: &str = "CLIENT_REGISTRY_DEFAULTS";

pub const LOGGER_NAME: &str = "@client-registry/registry";
