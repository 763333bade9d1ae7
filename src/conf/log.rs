//! Logging settings.

use std::{borrow::Cow, str::FromStr as _};

use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

/// Logging settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, SmartDefault)]
#[serde(default)]
pub struct Log {
    /// Maximum allowed level of log entries, case-insensitive.
    ///
    /// `OFF` (or any unrecognized value) disables logging. Defaults to
    /// `INFO`.
    #[default("INFO")]
    pub level: Cow<'static, str>,
}

impl Log {
    /// Returns configured logging level. [`None`] if disabled.
    #[must_use]
    pub fn level(&self) -> Option<slog::Level> {
        slog::Level::from_str(&self.level).ok()
    }

    /// Returns configured logging level in terms of the [`log`] facade.
    ///
    /// `CRITICAL` has no counterpart there, so it's narrowed to `ERROR`.
    #[must_use]
    pub fn facade_level(&self) -> Option<log::Level> {
        self.level().map(|lvl| match lvl {
            slog::Level::Critical | slog::Level::Error => log::Level::Error,
            slog::Level::Warning => log::Level::Warn,
            slog::Level::Info => log::Level::Info,
            slog::Level::Debug => log::Level::Debug,
            slog::Level::Trace => log::Level::Trace,
        })
    }
}
