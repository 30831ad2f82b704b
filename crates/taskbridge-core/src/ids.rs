//! Identifier for adapted instances, used to correlate log lines.

use std::fmt;
use uuid::Uuid;

/// Random per-instance identifier, rendered as a hyphenated uuid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BridgeId(Uuid);

impl BridgeId {
    /// Generate a new random BridgeId.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for BridgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
