//! Configuration for worker probing.

use serde::{Deserialize, Serialize};

/// Configuration for worker connectivity probes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Timeout for each strategy request
    pub timeout_seconds: u64,
    /// Fixed delay between consecutive probes in a probe-all run
    pub stagger_ms: u64,
    /// Seconds between cycles of the scheduled poll loop
    pub interval_seconds: u64,
    /// Value sent as `Origin` on preflight and POST probes
    pub origin: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 15,
            stagger_ms: 500,
            interval_seconds: 300,
            origin: "https://localhost".to_string(),
        }
    }
}
