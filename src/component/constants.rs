pub const LOGGER_NAME: &str = "@client-registry/component";
