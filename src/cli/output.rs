//! Output formatting helpers for CLI commands

use crate::cascade::{CascadeResult, ClearStatus};
use crate::health::{ProbeStatus, ProbeSummary, WorkerProbe};
use crate::model::{format_display_name, ModelResolution};
use crate::registry::WorkerType;
use crate::sync::{DataSource, RateLimitConfig, SaveOutcome, WorkerModelConfiguration};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

/// Serialize any value as pretty JSON.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, Box<dyn std::error::Error>> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Coloured label for a probe status
pub fn status_label(status: ProbeStatus) -> String {
    match status {
        ProbeStatus::Healthy => "Healthy".green().to_string(),
        ProbeStatus::Warning => "Warning".yellow().to_string(),
        ProbeStatus::Unhealthy => "Unhealthy".red().to_string(),
        ProbeStatus::Error => "Error".red().bold().to_string(),
    }
}

/// Get status icon for probe status
pub fn status_icon(status: ProbeStatus) -> &'static str {
    match status {
        ProbeStatus::Healthy => "✓",
        ProbeStatus::Warning => "!",
        ProbeStatus::Unhealthy => "✗",
        ProbeStatus::Error => "✗",
    }
}

fn model_cell(model: &ModelResolution) -> String {
    match model {
        ModelResolution::Configured(info) => info.display_name.clone(),
        ModelResolution::NotConfigured { placeholder } => placeholder.dimmed().to_string(),
    }
}

/// Format a single probe with its diagnostic trail
pub fn format_probe_detail(probe: &WorkerProbe) -> String {
    let mut output = String::new();
    let result = &probe.result;

    let _ = writeln!(
        output,
        "{} {} ({})",
        status_icon(result.status),
        probe.display_name.bold(),
        probe.worker_id
    );
    let _ = writeln!(output, "  Status:   {}", status_label(result.status));
    if let Some(strategy) = result.strategy_used {
        let _ = writeln!(output, "  Strategy: {}", strategy);
    }
    if let Some(code) = result.http_code {
        let _ = writeln!(output, "  HTTP:     {}", code);
    }
    let _ = writeln!(output, "  Time:     {}ms", result.response_time_ms);
    let _ = writeln!(output, "  Model:    {}", model_cell(&probe.model));
    let _ = writeln!(output, "  Diagnostics:");
    for line in &result.diagnostics {
        let _ = writeln!(output, "    - {}", line);
    }

    output
}

/// Format a probe-all run as a table with a summary line
pub fn format_probe_summary(summary: &ProbeSummary) -> String {
    let mut table = new_table(vec!["Worker", "Status", "Strategy", "HTTP", "Time", "Model"]);

    for probe in &summary.results {
        let result = &probe.result;
        table.add_row(vec![
            Cell::new(&probe.display_name),
            Cell::new(status_label(result.status)),
            Cell::new(
                result
                    .strategy_used
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(
                result
                    .http_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(format!("{}ms", result.response_time_ms)),
            Cell::new(model_cell(&probe.model)),
        ]);
    }

    let mut output = table.to_string();
    output.push('\n');
    let _ = write!(
        output,
        "{}/{} workers healthy ({:.1}%)",
        summary.successful, summary.total, summary.success_rate
    );
    if !summary.skipped.is_empty() {
        let _ = write!(output, "\nSkipped: {}", summary.skipped.join(", ").dimmed());
    }
    output
}

/// Format workers' reported models
pub fn format_current_models(summary: &ProbeSummary) -> String {
    let mut table = new_table(vec!["Worker", "Model", "Model ID", "Source"]);

    for probe in &summary.results {
        let (id, source) = match &probe.model {
            ModelResolution::Configured(info) => (
                info.model_id.clone(),
                info.reported_source
                    .clone()
                    .unwrap_or_else(|| info.source.to_string()),
            ),
            ModelResolution::NotConfigured { .. } => ("-".to_string(), "-".to_string()),
        };
        table.add_row(vec![
            Cell::new(&probe.display_name),
            Cell::new(model_cell(&probe.model)),
            Cell::new(id),
            Cell::new(source),
        ]);
    }

    table.to_string()
}

/// Format the per worker type model configuration view
pub fn format_model_configurations(
    view: &BTreeMap<WorkerType, WorkerModelConfiguration>,
) -> String {
    let mut table = new_table(vec!["Worker", "Model", "Model ID", "Custom"]);

    for (worker_type, config) in view {
        let (name, id) = match &config.model {
            Some(model) => (format_display_name(model), model.clone()),
            None => (crate::model::PROXY_SERVICE.to_string(), "-".to_string()),
        };
        table.add_row(vec![
            Cell::new(worker_type.display_name()),
            Cell::new(name),
            Cell::new(id),
            Cell::new(if config.is_custom { "yes" } else { "" }),
        ]);
    }

    let source = match view.values().next().map(|c| c.data_source) {
        Some(DataSource::KvNamespace) => "KV namespace".green().to_string(),
        _ => "defaults only".yellow().to_string(),
    };
    format!("{}\nSource: {}", table, source)
}

/// Format a worker's rate limits
pub fn format_rate_limits(worker_id: &str, config: &RateLimitConfig) -> String {
    let mut table = new_table(vec!["Setting", "Value"]);
    let thresholds = &config.violation_thresholds;
    let rows: [(&str, String); 8] = [
        ("Enabled", config.enabled.to_string()),
        ("Hourly", config.hourly.to_string()),
        ("Daily", config.daily.to_string()),
        ("Weekly", config.weekly.to_string()),
        ("Monthly", config.monthly.to_string()),
        ("Soft threshold", thresholds.soft.to_string()),
        ("Hard threshold", thresholds.hard.to_string()),
        ("Ban threshold", thresholds.ban.to_string()),
    ];
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(value)]);
    }
    format!(
        "{}\n{}",
        crate::registry::format_worker_name(worker_id).bold(),
        table
    )
}

/// Format the cascade part of a save
pub fn format_cascade(result: &CascadeResult) -> String {
    let mut output = String::new();
    if result.attempted == 0 && result.skipped == 0 {
        let _ = writeln!(output, "No workers needed a cache refresh.");
        return output;
    }

    let _ = writeln!(
        output,
        "Cache refresh: {}/{} workers notified",
        result.successful, result.attempted
    );
    for (worker_id, clear) in &result.per_worker {
        let status = match clear.status {
            ClearStatus::Cleared => "cleared".green().to_string(),
            ClearStatus::NotSupported => "not supported".cyan().to_string(),
            ClearStatus::Failed => "failed".red().to_string(),
            ClearStatus::Skipped => "skipped".dimmed().to_string(),
        };
        let _ = writeln!(output, "  {} {}: {}", worker_id, status, clear.detail);
    }
    output
}

/// Format the outcome of a model mapping save
pub fn format_save_outcome(outcome: &SaveOutcome) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "{} Model configuration saved ({} changed)",
        "✓".green(),
        outcome.changed.len()
    );
    for replaced in &outcome.replaced {
        let _ = writeln!(
            output,
            "  {} '{}' is not a valid model id for {}; using {}",
            "!".yellow(),
            replaced.submitted,
            replaced.worker_type.display_name(),
            replaced.used.as_deref().unwrap_or("none")
        );
    }
    if !outcome.ignored.is_empty() {
        let _ = writeln!(
            output,
            "  {} ignored unknown worker types: {}",
            "!".yellow(),
            outcome.ignored.join(", ")
        );
    }

    output.push_str(&format_cascade(&outcome.cascade));
    if let Some(partial) = outcome.partial_failure() {
        let _ = writeln!(output, "{}", partial.to_string().yellow());
    }

    match &outcome.confirmed {
        Some(_) => output.push_str("Read-back confirmed."),
        None => output.push_str(&"Read-back unavailable.".yellow().to_string()),
    }
    output
}
