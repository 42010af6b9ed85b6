//! Cache invalidation cascade configuration

use serde::{Deserialize, Serialize};

/// Settings for the post-write worker cache-clear fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    /// Timeout for each `/cache/clear` call
    pub timeout_seconds: u64,
    /// Upper bound on in-flight calls; 0 means one per target
    pub max_concurrency: usize,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            max_concurrency: 0,
        }
    }
}
