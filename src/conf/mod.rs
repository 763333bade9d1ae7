//! Application configuration.
//!
//! Values are applied from the following sources, in that order:
//! 1. default values;
//! 2. configuration file, whose name is given either via
//!    `VIDEOROOM_CONF` environment variable or `--conf` command line
//!    argument;
//! 3. `VIDEOROOM_`-prefixed environment variables, with `__` separating
//!    nested sections (`VIDEOROOM_LOG__LEVEL=WARN`).

pub mod log;
pub mod room;

use std::env;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

#[doc(inline)]
pub use self::{
    log::Log,
    room::{Bandwidth, Room},
};

/// CLI argument that is responsible for holding application configuration
/// file path.
pub const APP_CONF_PATH_CMD_ARG_NAME: &str = "--conf";

/// Environment variable that is responsible for holding application
/// configuration file path.
pub const APP_CONF_PATH_ENV_VAR_NAME: &str = "VIDEOROOM_CONF";

/// Prefix of environment variables overriding configuration values.
const ENV_PREFIX: &str = "VIDEOROOM";

/// Holds application config.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, SmartDefault)]
#[serde(default)]
pub struct Conf {
    /// Logging settings.
    pub log: Log,

    /// Room settings.
    pub room: Room,
}

impl Conf {
    /// Creates new [`Conf`] and applies values from such sources
    /// and in that order:
    /// - default values;
    /// - configuration file, the name of which is given as a command line
    ///   parameter or environment variable;
    /// - environment variables.
    ///
    /// # Errors
    ///
    /// Errors if parsing fails.
    pub fn parse() -> Result<Self, ConfigError> {
        let mut cfg = Config::new();

        let env_var = env::var(APP_CONF_PATH_ENV_VAR_NAME);
        if let Some(path) = get_conf_file_name(env_var, env::args()) {
            cfg.merge(File::with_name(&path))?;
        }

        cfg.merge(Environment::with_prefix(ENV_PREFIX).separator("__"))?;

        cfg.try_into()
    }
}

/// Returns the path to a configuration file, if it's set via the
/// environment variable or the command line argument.
///
/// The environment variable takes priority.
fn get_conf_file_name<T>(
    env_var: Result<String, env::VarError>,
    cmd_args: T,
) -> Option<String>
where
    T: IntoIterator<Item = String>,
{
    if let Ok(path) = env_var {
        return Some(path);
    }
    cmd_args
        .into_iter()
        .skip_while(|arg| arg != APP_CONF_PATH_CMD_ARG_NAME)
        .nth(1)
}
