//! Provider liveness model.

use serde::{Deserialize, Serialize};

/// Liveness of one provider, computed on demand by probing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatus {
    /// Provider name as reported by the data source.
    pub name: String,
    /// Whether the liveness probe succeeded within its deadline.
    pub healthy: bool,
}

impl ProviderStatus {
    /// Creates a new provider status.
    #[must_use]
    pub fn new(name: impl Into<String>, healthy: bool) -> Self {
        Self {
            name: name.into(),
            healthy,
        }
    }
}
