//! Manager configuration.
//!
//! Configuration is per thread, like the manager it configures. It can be
//! built in code or parsed from JSON:
//!
//! ```
//! use tripwire_core::{config::ManagerConfig, Depth};
//!
//! let config = ManagerConfig::from_json(r#"{ "default_depth": "deep" }"#).unwrap();
//! assert_eq!(config.default_depth, Depth::Deep);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tracked::Depth;

/// Tunables for the thread's [`Manager`](crate::reactive::Manager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Depth used by [`Trigger::new`](crate::reactive::Trigger::new).
    pub default_depth: Depth,

    /// Warn when a change is reported for a trigger nobody subscribes to.
    ///
    /// Such a notification usually points at a caller bug, but triggers move
    /// between zero and non-zero subscribers all the time, so it is only
    /// ever logged.
    pub report_orphan_changes: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            default_depth: Depth::Value,
            report_orphan_changes: cfg!(debug_assertions),
        }
    }
}

impl ManagerConfig {
    /// Parse a configuration from a JSON document.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize this configuration as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
