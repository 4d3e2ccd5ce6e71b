//! Hook dispatch configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the dispatch engine and the runtime boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookConfig {
    /// Wall-clock budget for a single listener invocation, in milliseconds.
    #[serde(default = "default_listener_timeout")]
    pub listener_timeout_ms: u64,
    /// Log a warning when a listener neither calls `next()` nor `preventDefault()`.
    #[serde(default = "default_true")]
    pub warn_on_silent_listener: bool,
    /// Number of fault records kept per extension.
    #[serde(default = "default_fault_history")]
    pub fault_history: usize,
}

impl HookConfig {
    /// The per-invocation timeout as a `Duration`.
    pub fn listener_timeout(&self) -> Duration {
        Duration::from_millis(self.listener_timeout_ms)
    }
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            listener_timeout_ms: default_listener_timeout(),
            warn_on_silent_listener: default_true(),
            fault_history: default_fault_history(),
        }
    }
}

fn default_listener_timeout() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

fn default_fault_history() -> usize {
    32
}
