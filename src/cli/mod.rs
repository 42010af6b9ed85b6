//! CLI module for faqsync
//!
//! Command-line interface definitions and handlers. The CLI stands in for
//! the administrative surface of the worker fleet.
//!
//! # Commands
//!
//! - `probe` - Probe one worker
//! - `probe-all` - Probe every enabled worker
//! - `watch` - Probe on an interval until interrupted
//! - `models` - Show, set or reset the AI model mapping
//! - `rate-limits` - Show, set or reset per-worker rate limits
//! - `settings` - Show global settings
//! - `kv` - Inspect the remote configuration store
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Probe every worker in faqsync.toml
//! faqsync probe-all
//!
//! # Switch the SEO analyzer to another model
//! faqsync models set seo_analyzer=@cf/google/gemma-3-12b-it
//! ```

pub mod completions;
pub mod config;
pub mod kv;
pub mod models;
pub mod output;
pub mod probe;
pub mod rate_limits;
pub mod settings;

pub use completions::handle_completions;
pub use config::handle_config_init;

use crate::cascade::Cascade;
use crate::config::SyncConfig;
use crate::health::Prober;
use crate::kv::{ConfigurationStore, KvClient};
use crate::registry::Registry;
use crate::sync::ConfigSync;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default configuration file name.
pub const DEFAULT_CONFIG: &str = "faqsync.toml";

/// faqsync - Worker health and configuration sync
#[derive(Parser, Debug)]
#[command(
    name = "faqsync",
    version,
    about = "Probe FAQ generation workers and sync their configuration through a remote KV store"
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG, env = "FAQSYNC_CONFIG")]
    pub config: PathBuf,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe a single worker
    Probe(ProbeArgs),
    /// Probe every enabled worker with a URL
    ProbeAll(JsonArgs),
    /// Probe all workers on an interval until Ctrl-C
    Watch(WatchArgs),
    /// Manage the AI model mapping
    #[command(subcommand)]
    Models(ModelsCommands),
    /// Manage per-worker rate limits
    #[command(subcommand)]
    RateLimits(RateLimitsCommands),
    /// Global settings
    #[command(subcommand)]
    Settings(SettingsCommands),
    /// Remote configuration store utilities
    #[command(subcommand)]
    Kv(KvCommands),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct JsonArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Worker id from the configuration file
    pub worker: Option<String>,

    /// Probe this base URL instead of the configured one
    #[arg(short, long)]
    pub url: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Seconds between cycles (overrides probe.interval_seconds)
    #[arg(short, long)]
    pub interval: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum ModelsCommands {
    /// Show the stored model mapping per worker type
    Show(ModelsShowArgs),
    /// Show the model each worker reports from its health endpoint
    Current(JsonArgs),
    /// Assign models, e.g. `seo_analyzer=@cf/google/gemma-3-12b-it`
    Set(ModelsSetArgs),
    /// Restore default models for every worker type
    Reset(JsonArgs),
}

#[derive(Args, Debug)]
pub struct ModelsShowArgs {
    /// Bypass the local cache
    #[arg(long)]
    pub refresh: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ModelsSetArgs {
    /// One or more `worker_type=model_id` pairs
    #[arg(required = true, value_name = "WORKER=MODEL")]
    pub assignments: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum RateLimitsCommands {
    /// Show a worker's rate limits
    Show(RateLimitsShowArgs),
    /// Change a worker's rate limits
    Set(RateLimitsSetArgs),
    /// Restore default rate limits for a worker
    Reset(WorkerArg),
}

#[derive(Args, Debug)]
pub struct WorkerArg {
    /// Worker id
    pub worker: String,
}

#[derive(Args, Debug)]
pub struct RateLimitsShowArgs {
    /// Worker id
    pub worker: String,

    /// Bypass the local cache
    #[arg(long)]
    pub refresh: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct RateLimitsSetArgs {
    /// Worker id
    pub worker: String,

    #[arg(long)]
    pub hourly: Option<u32>,

    #[arg(long)]
    pub daily: Option<u32>,

    #[arg(long)]
    pub weekly: Option<u32>,

    #[arg(long)]
    pub monthly: Option<u32>,

    /// Soft violation threshold
    #[arg(long)]
    pub soft: Option<u32>,

    /// Hard violation threshold
    #[arg(long)]
    pub hard: Option<u32>,

    /// Ban violation threshold
    #[arg(long)]
    pub ban: Option<u32>,

    /// Enable or disable rate limiting for this worker
    #[arg(long)]
    pub enabled: Option<bool>,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Show global settings
    Show(JsonArgs),
}

#[derive(Subcommand, Debug)]
pub enum KvCommands {
    /// Check that the credentials can reach the namespace
    Test,
    /// Print a stored value
    Get(KvGetArgs),
    /// Delete a stored value
    Delete(KvKeyArgs),
}

#[derive(Args, Debug)]
pub struct KvGetArgs {
    /// Logical key, e.g. ai_model_config
    pub key: String,

    /// Bypass the local cache
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Args, Debug)]
pub struct KvKeyArgs {
    /// Logical key
    pub key: String,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// Configuration and shared services for one CLI invocation.
pub struct AppContext {
    pub config: SyncConfig,
    pub registry: Arc<Registry>,
}

impl AppContext {
    /// Load configuration with CLI > env > file > defaults precedence.
    ///
    /// A missing file is only an error when it is not the default path.
    pub fn load(path: &Path, log_level: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let file_config = if path.exists() || path != Path::new(DEFAULT_CONFIG) {
            SyncConfig::load(Some(path))?
        } else {
            SyncConfig::default()
        };
        let mut config = file_config.with_env_overrides();

        if let Some(level) = log_level {
            config.logging.level = level.to_string();
        }
        config.validate()?;

        let registry = Arc::new(Registry::from_configs(&config.workers)?);
        Ok(Self { config, registry })
    }

    pub fn kv_client(&self) -> Result<Arc<KvClient>, Box<dyn std::error::Error>> {
        Ok(Arc::new(KvClient::new(self.config.kv.clone())?))
    }

    pub fn prober(&self) -> Result<Prober, Box<dyn std::error::Error>> {
        Ok(Prober::new(self.config.probe.clone())?)
    }

    pub fn sync(&self) -> Result<ConfigSync, Box<dyn std::error::Error>> {
        let store: Arc<dyn ConfigurationStore> = self.kv_client()?;
        let cascade = Cascade::new(self.config.cascade.clone())?;
        Ok(ConfigSync::new(store, self.registry.clone(), cascade))
    }
}
