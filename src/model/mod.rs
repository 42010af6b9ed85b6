//! Model resolution module.
//!
//! Workers report the model they run in heterogeneous shapes. This module
//! pulls the active model out of a health response body with an ordered
//! chain of extractors, and formats model identifiers for display.

mod display;
mod id;

pub use display::format_display_name;
pub use id::is_valid_model_id;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::WorkerType;

/// Placeholder shown when no extractor matches.
pub const NOT_CONFIGURED: &str = "No Model Configured";

/// Placeholder shown for proxy workers.
pub const PROXY_SERVICE: &str = "N/A (Proxy Service)";

/// Which part of the health body the model was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSource {
    /// Top-level `current_model`
    CurrentModel,
    /// `model.name`
    ModelName,
    /// Top-level `model` string
    ModelField,
    /// `ai_model_config.current_model`
    AiModelConfig,
    /// `configuration.ai_model`
    Configuration,
    /// `config.ai_model`
    LegacyConfig,
}

impl ModelSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSource::CurrentModel => "current_model",
            ModelSource::ModelName => "model.name",
            ModelSource::ModelField => "model",
            ModelSource::AiModelConfig => "ai_model_config",
            ModelSource::Configuration => "configuration",
            ModelSource::LegacyConfig => "config",
        }
    }
}

impl std::fmt::Display for ModelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The model a worker reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_id: String,
    pub display_name: String,
    pub source: ModelSource,
    /// The worker's own `model_source` field, when it reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_source: Option<String>,
    /// The worker's `timestamp` field, when it reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_timestamp: Option<String>,
}

impl ModelInfo {
    fn new(model_id: &str, source: ModelSource) -> Self {
        Self {
            model_id: model_id.to_string(),
            display_name: format_display_name(model_id),
            source,
            reported_source: None,
            config_timestamp: None,
        }
    }

    fn with_display_name(mut self, display_name: Option<&str>) -> Self {
        if let Some(name) = display_name {
            self.display_name = name.to_string();
        }
        self
    }
}

/// Outcome of running the extraction chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ModelResolution {
    Configured(ModelInfo),
    NotConfigured { placeholder: String },
}

impl ModelResolution {
    fn not_configured(placeholder: &str) -> Self {
        ModelResolution::NotConfigured {
            placeholder: placeholder.to_string(),
        }
    }

    /// Model identifier, if one was found.
    pub fn model_id(&self) -> Option<&str> {
        match self {
            ModelResolution::Configured(info) => Some(&info.model_id),
            ModelResolution::NotConfigured { .. } => None,
        }
    }

    /// Text to show in a status column.
    pub fn label(&self) -> &str {
        match self {
            ModelResolution::Configured(info) => &info.display_name,
            ModelResolution::NotConfigured { placeholder } => placeholder,
        }
    }
}

type Extractor = fn(&Value) -> Option<ModelInfo>;

/// Extractors in priority order. The first match wins.
const EXTRACTORS: [Extractor; 6] = [
    from_current_model,
    from_model_name,
    from_model_field,
    from_ai_model_config,
    from_configuration,
    from_legacy_config,
];

/// Resolve the active model from a worker health response body.
///
/// Never fails: a body with no recognizable model field yields
/// [`ModelResolution::NotConfigured`].
///
/// ```
/// use faqsync::model::{resolve_current_model, ModelResolution, ModelSource};
/// use serde_json::json;
///
/// let body = json!({
///     "current_model": "@cf/meta/llama-3.1-8b-instruct",
///     "model": { "name": "@cf/meta/other" }
/// });
/// match resolve_current_model(&body) {
///     ModelResolution::Configured(info) => {
///         assert_eq!(info.model_id, "@cf/meta/llama-3.1-8b-instruct");
///         assert_eq!(info.source, ModelSource::CurrentModel);
///     }
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub fn resolve_current_model(body: &Value) -> ModelResolution {
    match EXTRACTORS.iter().find_map(|extract| extract(body)) {
        Some(mut info) => {
            info.reported_source = non_empty_str(body.get("model_source")).map(str::to_string);
            info.config_timestamp = body.get("timestamp").and_then(timestamp_string);
            ModelResolution::Configured(info)
        }
        None => ModelResolution::not_configured(NOT_CONFIGURED),
    }
}

/// Resolve for a known worker type; proxy workers never report a model.
pub fn resolve_for_worker(worker_type: Option<WorkerType>, body: Option<&Value>) -> ModelResolution {
    if worker_type.is_some_and(|t| t.is_proxy()) {
        return ModelResolution::not_configured(PROXY_SERVICE);
    }
    match body {
        Some(body) => resolve_current_model(body),
        None => ModelResolution::not_configured(NOT_CONFIGURED),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn timestamp_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn from_current_model(body: &Value) -> Option<ModelInfo> {
    non_empty_str(body.get("current_model")).map(|id| ModelInfo::new(id, ModelSource::CurrentModel))
}

fn from_model_name(body: &Value) -> Option<ModelInfo> {
    let model = body.get("model")?;
    non_empty_str(model.get("name")).map(|id| {
        ModelInfo::new(id, ModelSource::ModelName)
            .with_display_name(non_empty_str(model.get("display_name")))
    })
}

fn from_model_field(body: &Value) -> Option<ModelInfo> {
    non_empty_str(body.get("model")).map(|id| ModelInfo::new(id, ModelSource::ModelField))
}

fn from_ai_model_config(body: &Value) -> Option<ModelInfo> {
    let config = body.get("ai_model_config")?;
    non_empty_str(config.get("current_model")).map(|id| {
        ModelInfo::new(id, ModelSource::AiModelConfig)
            .with_display_name(non_empty_str(config.get("display_name")))
    })
}

fn from_configuration(body: &Value) -> Option<ModelInfo> {
    non_empty_str(body.get("configuration").and_then(|c| c.get("ai_model")))
        .map(|id| ModelInfo::new(id, ModelSource::Configuration))
}

fn from_legacy_config(body: &Value) -> Option<ModelInfo> {
    non_empty_str(body.get("config").and_then(|c| c.get("ai_model")))
        .map(|id| ModelInfo::new(id, ModelSource::LegacyConfig))
}
