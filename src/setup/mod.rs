//! Loading the launcher's settings.

mod config;

pub use config::Config;
pub use config::ConfigSource;

use crate::error::ConfigError;

/// Reads the config from [Config::path].
pub(super) fn load() -> Result<(Config, ConfigSource), ConfigError> {
    Config::read(&Config::path())
}
