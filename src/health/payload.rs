//! Synthetic request bodies for POST probes.

use crate::registry::WorkerType;
use serde_json::{json, Value};

const SAMPLE_QUESTION: &str = "What is AI FAQ Generator?";

/// A minimal well-formed request for the worker type.
///
/// Unknown worker ids get the generic question payload.
pub fn synthetic_payload(worker_type: Option<WorkerType>, origin: &str) -> Value {
    match worker_type {
        Some(WorkerType::FaqEnhancer) => json!({
            "faq": [{
                "question": SAMPLE_QUESTION,
                "answer": "A WordPress plugin for generating FAQs."
            }],
            "mode": "enhance"
        }),
        Some(WorkerType::SeoAnalyzer) => json!({
            "content": SAMPLE_QUESTION,
            "mode": "analyze"
        }),
        Some(WorkerType::FaqExtractor) => json!({
            "url": origin,
            "mode": "extract"
        }),
        Some(WorkerType::TopicGenerator) => json!({
            "input": "WordPress AI FAQ Generator",
            "mode": "generate"
        }),
        Some(WorkerType::QuestionGenerator) | Some(WorkerType::AnswerGenerator) | None => json!({
            "question": SAMPLE_QUESTION,
            "mode": "generate"
        }),
    }
}
