//! Bridge configuration types
//!
//! The bridge needs very little configuration: which non-terminal events are
//! forwarded to the native receiver, and how large the session table starts.
//! Terminal delivery is never configurable.

use crate::types::Progress;
use serde::{Deserialize, Serialize};

/// Configuration for a [`Bridge`](crate::Bridge)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Master switch for the progress path (false = terminal notifications only)
    #[serde(default = "default_true")]
    pub forward_progress: bool,

    /// Forward rejected attempts as `Progress::Failed`
    #[serde(default = "default_true")]
    pub forward_failed: bool,

    /// Forward help messages as `Progress::Help`
    #[serde(default = "default_true")]
    pub forward_help: bool,

    /// Initial capacity of the session table (default: 16)
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,
}

fn default_true() -> bool {
    true
}

fn default_initial_capacity() -> usize {
    16
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            forward_progress: true,
            forward_failed: true,
            forward_help: true,
            initial_capacity: default_initial_capacity(),
        }
    }
}

impl BridgeConfig {
    /// Create a new bridge configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: enable or disable the whole progress path
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.forward_progress = enabled;
        self
    }

    /// Builder method: enable or disable forwarding of rejected attempts
    pub fn with_failed(mut self, enabled: bool) -> Self {
        self.forward_failed = enabled;
        self
    }

    /// Builder method: enable or disable forwarding of help messages
    pub fn with_help(mut self, enabled: bool) -> Self {
        self.forward_help = enabled;
        self
    }

    /// Builder method: set the initial session table capacity
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Check if a progress notification should reach the receiver
    pub fn should_forward(&self, progress: &Progress) -> bool {
        self.forward_progress
            && match progress {
                Progress::Failed { .. } => self.forward_failed,
                Progress::Help { .. } => self.forward_help,
            }
    }
}
