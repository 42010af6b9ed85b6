//! Configuration sync module.
//!
//! [`ConfigSync`] is the entry point for administrative changes. A save runs
//! through validation, a single write to the remote store, a best-effort
//! cache-clear cascade to the affected workers, and a fresh read-back for
//! confirmation. A failed write ends the operation with no cascade.
//!
//! Concurrent writers are not reconciled: the last write wins.

mod error;
mod model_config;
mod rate_limit;
mod settings;


pub use error::*;
pub use model_config::*;
pub use rate_limit::*;
pub use settings::*;

use crate::cascade::{Cascade, CascadeResult, PartialCascadeFailure};
use crate::kv::{worker_config_key, ConfigurationStore, GLOBAL_SETTINGS_KEY, MODEL_CONFIG_KEY};
use crate::registry::{Registry, WorkerType};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Phases of a save, used in log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStage {
    Validating,
    Writing,
    CascadingBestEffort,
    Done,
}

impl fmt::Display for SaveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SaveStage::Validating => "validating",
            SaveStage::Writing => "writing",
            SaveStage::CascadingBestEffort => "cascading",
            SaveStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of a successful model mapping save.
#[derive(Debug, Clone, Serialize)]
pub struct SaveOutcome {
    /// The blob that was written
    pub config: ModelConfig,
    /// Worker types whose effective model changed
    pub changed: Vec<WorkerType>,
    /// Invalid submissions replaced with defaults
    pub replaced: Vec<ReplacedEntry>,
    /// Submitted keys that name no known worker type
    pub ignored: Vec<String>,
    pub cascade: CascadeResult,
    /// Fresh read-back, `None` when it failed
    pub confirmed: Option<ModelConfig>,
}

impl SaveOutcome {
    pub fn partial_failure(&self) -> Option<PartialCascadeFailure> {
        self.cascade.partial_failure()
    }
}

/// Orchestrates configuration reads and writes for the worker fleet.
pub struct ConfigSync {
    store: Arc<dyn ConfigurationStore>,
    registry: Arc<Registry>,
    cascade: Cascade,
}

impl ConfigSync {
    pub fn new(store: Arc<dyn ConfigurationStore>, registry: Arc<Registry>, cascade: Cascade) -> Self {
        Self {
            store,
            registry,
            cascade,
        }
    }

    pub fn store(&self) -> &Arc<dyn ConfigurationStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    async fn read<T: DeserializeOwned>(
        &self,
        key: &str,
        force_refresh: bool,
    ) -> Result<Option<T>, SyncError> {
        match self.store.get(key, force_refresh).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| SyncError::Corrupt(format!("{key}: {e}"))),
            None => Ok(None),
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), SyncError> {
        let value = serde_json::to_value(value).map_err(|e| SyncError::ValidationFailed {
            field: key.to_string(),
            message: e.to_string(),
        })?;
        self.store.put(key, &value).await?;
        Ok(())
    }

    // ========================================================================
    // Model mapping
    // ========================================================================

    /// Current model mapping. An absent blob yields an empty mapping, for
    /// which every worker type uses its default.
    pub async fn model_config(&self, force_refresh: bool) -> Result<ModelConfig, SyncError> {
        Ok(self
            .read(MODEL_CONFIG_KEY, force_refresh)
            .await?
            .unwrap_or_default())
    }

    /// Per worker type view. Falls back to defaults when the store is
    /// unconfigured or unreachable.
    pub async fn worker_configurations(
        &self,
        force_refresh: bool,
    ) -> BTreeMap<WorkerType, WorkerModelConfiguration> {
        if !self.store.is_configured() {
            return configuration_view(None);
        }
        match self.read::<ModelConfig>(MODEL_CONFIG_KEY, force_refresh).await {
            Ok(Some(config)) => configuration_view(Some(&config)),
            Ok(None) => configuration_view(None),
            Err(e) => {
                tracing::warn!(error = %e, "Falling back to default model mapping");
                configuration_view(None)
            }
        }
    }

    /// Save submitted `(worker_type, model_id)` pairs.
    ///
    /// Invalid identifiers fall back to the worker type's default. The
    /// stored blob is the previous effective mapping overlaid with the
    /// validated submissions; the cascade targets only worker types whose
    /// effective model changed.
    pub async fn save_model_mapping(
        &self,
        submissions: &BTreeMap<String, String>,
    ) -> Result<SaveOutcome, SyncError> {
        tracing::debug!(stage = %SaveStage::Validating, entries = submissions.len(), "Saving model mapping");
        let validated = validate_mapping(
            submissions
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );
        if validated.accepted.is_empty() {
            return Err(SyncError::ValidationFailed {
                field: "ai_models".to_string(),
                message: format!(
                    "no known worker types submitted (ignored: {})",
                    validated.ignored.join(", ")
                ),
            });
        }
        self.apply_model_mapping(validated).await
    }

    /// Restore the compiled-in defaults for every worker type.
    pub async fn reset_models(&self) -> Result<SaveOutcome, SyncError> {
        tracing::debug!(stage = %SaveStage::Validating, "Resetting model mapping");
        let validated = ValidatedMapping {
            accepted: default_effective_map(),
            ..ValidatedMapping::default()
        };
        self.apply_model_mapping(validated).await
    }

    async fn apply_model_mapping(&self, validated: ValidatedMapping) -> Result<SaveOutcome, SyncError> {
        if !self.store.is_configured() {
            return Err(SyncError::NotConfigured(
                "KV credentials are required to save model configuration".to_string(),
            ));
        }

        // Unsubmitted types keep their stored model, so the save cannot
        // proceed without it.
        let previous = match self.read::<ModelConfig>(MODEL_CONFIG_KEY, true).await {
            Ok(config) => config.unwrap_or_default().effective_map(),
            Err(e) => {
                tracing::error!(stage = %SaveStage::Validating, error = %e, "Could not read current model mapping, save aborted");
                return Err(e);
            }
        };

        let mut next = previous.clone();
        for (worker_type, model) in &validated.accepted {
            next.insert(*worker_type, model.clone());
        }

        let changed: Vec<WorkerType> = WorkerType::ALL
            .into_iter()
            .filter(|t| previous.get(t) != next.get(t))
            .collect();

        let config = ModelConfig::from_effective(&next);

        tracing::debug!(stage = %SaveStage::Writing, key = MODEL_CONFIG_KEY, "Writing model mapping");
        self.write(MODEL_CONFIG_KEY, &config).await?;

        tracing::debug!(stage = %SaveStage::CascadingBestEffort, changed = changed.len(), "Notifying workers");
        let targets: Vec<String> = changed.iter().map(|t| t.as_str().to_string()).collect();
        let cascade = self.cascade.cascade(&self.registry, &targets).await;

        let confirmed = match self.read::<ModelConfig>(MODEL_CONFIG_KEY, true).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Read-back after save failed");
                None
            }
        };

        tracing::info!(
            stage = %SaveStage::Done,
            changed = changed.len(),
            replaced = validated.replaced.len(),
            ignored = validated.ignored.len(),
            cascade_failed = cascade.failed,
            "Model mapping saved"
        );

        Ok(SaveOutcome {
            config,
            changed,
            replaced: validated.replaced,
            ignored: validated.ignored,
            cascade,
            confirmed,
        })
    }

    // ========================================================================
    // Rate limits
    // ========================================================================

    /// Rate limits for a worker, defaults when nothing is stored.
    pub async fn rate_limits(
        &self,
        worker_id: &str,
        force_refresh: bool,
    ) -> Result<RateLimitConfig, SyncError> {
        validate_worker_id(worker_id)?;
        Ok(self
            .read(&worker_config_key(worker_id), force_refresh)
            .await?
            .unwrap_or_default())
    }

    /// Save rate limits for a worker. Unusable values are replaced with
    /// defaults and the normalized config is returned. No cascade is run.
    pub async fn save_rate_limits(
        &self,
        worker_id: &str,
        mut config: RateLimitConfig,
    ) -> Result<RateLimitConfig, SyncError> {
        validate_worker_id(worker_id)?;
        let replaced = config.normalize();
        if !replaced.is_empty() {
            tracing::warn!(worker_id, fields = ?replaced, "Replaced invalid rate-limit values with defaults");
        }
        self.write(&worker_config_key(worker_id), &config).await?;
        tracing::info!(worker_id, "Rate limits saved");
        Ok(config)
    }

    pub async fn reset_rate_limits(&self, worker_id: &str) -> Result<RateLimitConfig, SyncError> {
        self.save_rate_limits(worker_id, RateLimitConfig::default())
            .await
    }

    // ========================================================================
    // Global settings
    // ========================================================================

    pub async fn global_settings(&self, force_refresh: bool) -> Result<GlobalSettings, SyncError> {
        Ok(self
            .read(GLOBAL_SETTINGS_KEY, force_refresh)
            .await?
            .unwrap_or_default())
    }

    pub async fn save_global_settings(&self, settings: &GlobalSettings) -> Result<(), SyncError> {
        self.write(GLOBAL_SETTINGS_KEY, settings).await
    }

    /// Raw stored value for any key.
    pub async fn raw(&self, key: &str, force_refresh: bool) -> Result<Option<Value>, SyncError> {
        Ok(self.store.get(key, force_refresh).await?)
    }
}

fn validate_worker_id(worker_id: &str) -> Result<(), SyncError> {
    let valid = !worker_id.is_empty()
        && worker_id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(SyncError::ValidationFailed {
            field: "worker_id".to_string(),
            message: format!("'{worker_id}' must be non-empty snake_case"),
        })
    }
}
