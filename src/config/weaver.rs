//! Weaver configuration.

use serde::Deserialize;

/// Settings applied by a [`Weaver`](crate::weaver::Weaver) to every class it
/// weaves.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WeaverConfig {
    /// Attribute names starting with this prefix are never intercepted.
    pub reserved_prefix: String,
    /// Emit a `trace!` event for every intercepted call.
    pub trace_calls: bool,
}

impl Default for WeaverConfig {
    fn default() -> Self {
        Self {
            reserved_prefix: "__".to_string(),
            trace_calls: false,
        }
    }
}

impl WeaverConfig {
    /// Returns true if `name` must bypass interception.
    ///
    /// An empty prefix reserves nothing.
    pub fn is_reserved(&self, name: &str) -> bool {
        !self.reserved_prefix.is_empty() && name.starts_with(&self.reserved_prefix)
    }
}
