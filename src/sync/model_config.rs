//! Stored AI model mapping and its validation.

use crate::model::is_valid_model_id;
use crate::registry::WorkerType;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The blob stored under `ai_model_config`.
///
/// A missing entry means "use the worker type's default"; proxy worker
/// types are stored as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(rename = "ai_models", default)]
    pub by_worker_type: BTreeMap<String, Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default, deserialize_with = "lenient_version")]
    pub version: u64,
}

/// Older writers stored the version as a release string such as `"2.4.0"`.
fn lenient_version<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s
            .split('.')
            .next()
            .and_then(|major| major.trim().parse().ok())
            .unwrap_or(0),
        _ => 0,
    })
}

impl ModelConfig {
    /// The compiled-in mapping for every worker type.
    pub fn defaults() -> Self {
        Self::from_effective(&default_effective_map())
    }

    /// Build a full blob from an effective per-type map.
    pub fn from_effective(map: &BTreeMap<WorkerType, Option<String>>) -> Self {
        let by_worker_type = WorkerType::ALL
            .into_iter()
            .map(|t| {
                let model = if t.is_proxy() {
                    None
                } else {
                    map.get(&t)
                        .cloned()
                        .flatten()
                        .or_else(|| t.default_model().map(str::to_string))
                };
                (t.as_str().to_string(), model)
            })
            .collect();
        Self {
            by_worker_type,
            ..Self::default()
        }
    }

    /// Stored model for a type, if the blob carries a usable one.
    pub fn stored_model(&self, worker_type: WorkerType) -> Option<&str> {
        self.by_worker_type
            .get(worker_type.as_str())
            .and_then(|m| m.as_deref())
            .filter(|m| !m.trim().is_empty())
    }

    /// Model in effect for a type: stored value, else the default.
    pub fn effective_model(&self, worker_type: WorkerType) -> Option<String> {
        if worker_type.is_proxy() {
            return None;
        }
        self.stored_model(worker_type)
            .or(worker_type.default_model())
            .map(str::to_string)
    }

    pub fn effective_map(&self) -> BTreeMap<WorkerType, Option<String>> {
        WorkerType::ALL
            .into_iter()
            .map(|t| (t, self.effective_model(t)))
            .collect()
    }
}

pub fn default_effective_map() -> BTreeMap<WorkerType, Option<String>> {
    WorkerType::ALL
        .into_iter()
        .map(|t| (t, t.default_model().map(str::to_string)))
        .collect()
}

/// A submitted model that failed validation and was swapped for the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplacedEntry {
    pub worker_type: WorkerType,
    pub submitted: String,
    pub used: Option<String>,
}

/// Submissions after per-entry validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedMapping {
    pub accepted: BTreeMap<WorkerType, Option<String>>,
    pub replaced: Vec<ReplacedEntry>,
    /// Submitted keys that name no known worker type
    pub ignored: Vec<String>,
}

/// Validate `(worker_type, model_id)` pairs, falling back per entry.
///
/// Invalid identifiers become the worker type's default, proxy types
/// become `None` and unknown types are reported in `ignored`.
pub fn validate_mapping<'a, I>(submissions: I) -> ValidatedMapping
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut validated = ValidatedMapping::default();

    for (key, model_id) in submissions {
        let Ok(worker_type) = key.parse::<WorkerType>() else {
            validated.ignored.push(key.to_string());
            continue;
        };

        if worker_type.is_proxy() {
            validated.accepted.insert(worker_type, None);
            continue;
        }

        let model_id = model_id.trim();
        if is_valid_model_id(model_id) {
            validated
                .accepted
                .insert(worker_type, Some(model_id.to_string()));
        } else {
            let used = worker_type.default_model().map(str::to_string);
            tracing::warn!(
                worker_type = %worker_type,
                submitted = model_id,
                "Invalid model id, using default"
            );
            validated.replaced.push(ReplacedEntry {
                worker_type,
                submitted: model_id.to_string(),
                used: used.clone(),
            });
            validated.accepted.insert(worker_type, used);
        }
    }

    validated
}

/// Where a worker model configuration view came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    KvNamespace,
    DefaultsOnly,
}

/// Per worker type view of the mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerModelConfiguration {
    pub model: Option<String>,
    pub default: Option<String>,
    pub is_custom: bool,
    pub data_source: DataSource,
}

/// Build the per-type view from a stored blob, or from defaults alone.
pub fn configuration_view(
    stored: Option<&ModelConfig>,
) -> BTreeMap<WorkerType, WorkerModelConfiguration> {
    let data_source = match stored {
        Some(_) => DataSource::KvNamespace,
        None => DataSource::DefaultsOnly,
    };

    WorkerType::ALL
        .into_iter()
        .map(|t| {
            let default = t.default_model().map(str::to_string);
            let stored_model = stored.and_then(|c| c.stored_model(t));
            let view = WorkerModelConfiguration {
                model: if t.is_proxy() {
                    None
                } else {
                    stored_model.map(str::to_string).or(default.clone())
                },
                is_custom: !t.is_proxy()
                    && stored_model.is_some_and(|m| Some(m) != t.default_model()),
                default,
                data_source,
            };
            (t, view)
        })
        .collect()
}
