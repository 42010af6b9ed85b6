use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::RegistryError;

/// Known worker service types.
///
/// Each type performs one FAQ-generation task and, except for the proxy
/// extractor, runs against a configured AI model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerType {
    QuestionGenerator,
    AnswerGenerator,
    FaqEnhancer,
    SeoAnalyzer,
    /// Proxy service, performs no inference
    FaqExtractor,
    TopicGenerator,
}

impl WorkerType {
    pub const ALL: [WorkerType; 6] = [
        WorkerType::QuestionGenerator,
        WorkerType::AnswerGenerator,
        WorkerType::FaqEnhancer,
        WorkerType::SeoAnalyzer,
        WorkerType::FaqExtractor,
        WorkerType::TopicGenerator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerType::QuestionGenerator => "question_generator",
            WorkerType::AnswerGenerator => "answer_generator",
            WorkerType::FaqEnhancer => "faq_enhancer",
            WorkerType::SeoAnalyzer => "seo_analyzer",
            WorkerType::FaqExtractor => "faq_extractor",
            WorkerType::TopicGenerator => "topic_generator",
        }
    }

    /// Human-readable name for tables and notices.
    pub fn display_name(&self) -> &'static str {
        match self {
            WorkerType::QuestionGenerator => "Question Generator",
            WorkerType::AnswerGenerator => "Answer Generator",
            WorkerType::FaqEnhancer => "FAQ Enhancer",
            WorkerType::SeoAnalyzer => "SEO Analyzer",
            WorkerType::FaqExtractor => "FAQ Extractor",
            WorkerType::TopicGenerator => "Topic Generator",
        }
    }

    /// Compiled-in model used whenever the stored mapping has no entry.
    pub fn default_model(&self) -> Option<&'static str> {
        match self {
            WorkerType::QuestionGenerator | WorkerType::AnswerGenerator => {
                Some("@cf/meta/llama-3.1-8b-instruct")
            }
            WorkerType::FaqEnhancer | WorkerType::SeoAnalyzer => {
                Some("@cf/meta/llama-3.3-70b-instruct-fp8-fast")
            }
            WorkerType::FaqExtractor => None,
            WorkerType::TopicGenerator => Some("@cf/meta/llama-4-scout-17b-16e-instruct"),
        }
    }

    /// Proxy workers never carry a model mapping.
    pub fn is_proxy(&self) -> bool {
        matches!(self, WorkerType::FaqExtractor)
    }
}

impl fmt::Display for WorkerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkerType {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        WorkerType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| RegistryError::UnknownWorkerType(s.to_string()))
    }
}

/// Format an arbitrary worker id for display, using the known name when there is one.
pub fn format_worker_name(id: &str) -> String {
    match id.parse::<WorkerType>() {
        Ok(worker_type) => worker_type.display_name().to_string(),
        Err(_) => id
            .split(['_', '-'])
            .filter(|part| !part.is_empty())
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Strip surrounding whitespace and trailing slashes from a base URL.
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// A deployed worker service.
///
/// Immutable for the duration of a probe or sync cycle; replaced wholesale on save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerEndpoint {
    /// Worker identifier, normally a [`WorkerType`] name
    pub id: String,
    /// Normalized base URL; empty when the worker is not deployed yet
    pub base_url: String,
    pub enabled: bool,
    /// Requests per hour
    pub rate_limit: u32,
}

impl WorkerEndpoint {
    pub fn new(id: impl Into<String>, base_url: &str, enabled: bool, rate_limit: u32) -> Self {
        Self {
            id: id.into(),
            base_url: normalize_base_url(base_url),
            enabled,
            rate_limit,
        }
    }

    pub fn has_url(&self) -> bool {
        !self.base_url.is_empty()
    }

    /// Enabled and reachable. Anything else is skipped by probe runs.
    pub fn is_probeable(&self) -> bool {
        self.enabled && self.has_url()
    }

    /// The known worker type for this endpoint, if its id names one.
    pub fn worker_type(&self) -> Option<WorkerType> {
        self.id.parse().ok()
    }

    pub fn display_name(&self) -> String {
        format_worker_name(&self.id)
    }
}

impl From<&crate::config::WorkerConfig> for WorkerEndpoint {
    fn from(config: &crate::config::WorkerConfig) -> Self {
        WorkerEndpoint::new(
            config.id.clone(),
            &config.url,
            config.enabled,
            config.rate_limit,
        )
    }
}
