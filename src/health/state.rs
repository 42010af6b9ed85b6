//! Probe outcome types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Outcome of a probe or of one strategy within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Healthy,
    /// Reachable but refusing cross-origin use
    Warning,
    /// Reachable but reporting a problem
    Unhealthy,
    Error,
}

impl ProbeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStatus::Healthy => "healthy",
            ProbeStatus::Warning => "warning",
            ProbeStatus::Unhealthy => "unhealthy",
            ProbeStatus::Error => "error",
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The HTTP technique a strategy uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StrategyKind {
    Get,
    Options,
    Post,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Get => "GET",
            StrategyKind::Options => "OPTIONS",
            StrategyKind::Post => "POST",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One strategy's attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyAttempt {
    pub strategy: StrategyKind,
    pub status: ProbeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_code: Option<u16>,
    pub elapsed_ms: u64,
    pub note: String,
    /// Decoded JSON response body, when there was one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl StrategyAttempt {
    pub fn new(strategy: StrategyKind, status: ProbeStatus, note: impl Into<String>) -> Self {
        Self {
            strategy,
            status,
            http_code: None,
            elapsed_ms: 0,
            note: note.into(),
            body: None,
        }
    }

    pub fn with_http_code(mut self, code: u16) -> Self {
        self.http_code = Some(code);
        self
    }

    pub fn with_body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }

    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    /// Line for the diagnostic trail.
    pub fn diagnostic(&self) -> String {
        match self.http_code {
            Some(code) => format!(
                "{} {} (HTTP {}, {}ms): {}",
                self.strategy, self.status, code, self.elapsed_ms, self.note
            ),
            None => format!(
                "{} {} ({}ms): {}",
                self.strategy, self.status, self.elapsed_ms, self.note
            ),
        }
    }
}

/// Result of probing one worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub status: ProbeStatus,
    /// Strategy whose outcome was selected; `None` when nothing was attempted
    pub strategy_used: Option<StrategyKind>,
    pub http_code: Option<u16>,
    /// Whole probe duration
    pub response_time_ms: u64,
    pub body: Option<Value>,
    pub diagnostics: Vec<String>,
    pub attempts: Vec<StrategyAttempt>,
}

impl ProbeResult {
    /// A result produced without any network traffic.
    pub fn not_attempted(diagnostic: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Error,
            strategy_used: None,
            http_code: None,
            response_time_ms: 0,
            body: None,
            diagnostics: vec![diagnostic.into()],
            attempts: Vec::new(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == ProbeStatus::Healthy
    }

    /// Note of the selected strategy, for one-line summaries.
    pub fn message(&self) -> &str {
        self.strategy_used
            .and_then(|kind| self.attempts.iter().rev().find(|a| a.strategy == kind))
            .map(|a| a.note.as_str())
            .or_else(|| self.diagnostics.first().map(String::as_str))
            .unwrap_or("")
    }
}
