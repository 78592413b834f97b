//! Executor configuration.

use serde::Deserialize;

/// Configuration for [`Executor`](crate::Executor) behavior.
///
/// Deserializable so applications can embed it in their own config files;
/// missing keys take the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Treat a filter the store cannot evaluate (unknown column) as matching
    /// nothing instead of failing with `InvalidFilter`.
    pub lenient_filters: bool,
    /// Include before/after snapshots in debug logs for every notification.
    pub log_snapshots: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            lenient_filters: true,
            log_snapshots: false,
        }
    }
}

impl ExecutorConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set lenient filter handling.
    pub fn lenient_filters(mut self, value: bool) -> Self {
        self.lenient_filters = value;
        self
    }

    /// Set snapshot logging.
    pub fn log_snapshots(mut self, value: bool) -> Self {
        self.log_snapshots = value;
        self
    }
}
