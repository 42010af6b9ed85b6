//! Worker endpoint configuration

use serde::{Deserialize, Serialize};

/// A worker as declared in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Worker type identifier (e.g. `answer_generator`)
    pub id: String,
    /// Base URL of the deployed worker; empty means unconfigured
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Requests per hour advertised to the admin surface
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,
}

fn default_enabled() -> bool {
    true
}

fn default_rate_limit() -> u32 {
    100
}
