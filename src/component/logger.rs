use std::sync::LazyLock;

use crate::component::constants::LOGGER_NAME;
use crate::logger::Logger;

pub static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new(LOGGER_NAME));
