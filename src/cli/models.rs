//! Models command handlers

use crate::cli::output::{
    format_current_models, format_model_configurations, format_save_outcome, to_json,
};
use crate::cli::{AppContext, JsonArgs, ModelsSetArgs, ModelsShowArgs};
use crate::sync::SaveOutcome;
use std::collections::BTreeMap;

/// Parse `worker_type=model_id` pairs. A repeated worker type keeps the
/// last value.
pub fn parse_assignments(
    assignments: &[String],
) -> Result<BTreeMap<String, String>, Box<dyn std::error::Error>> {
    let mut parsed = BTreeMap::new();
    for assignment in assignments {
        let (worker, model) = assignment
            .split_once('=')
            .ok_or_else(|| format!("Expected WORKER=MODEL, got '{}'", assignment))?;
        let worker = worker.trim();
        if worker.is_empty() {
            return Err(format!("Missing worker type in '{}'", assignment).into());
        }
        parsed.insert(worker.to_string(), model.trim().to_string());
    }
    Ok(parsed)
}

fn render_outcome(outcome: &SaveOutcome, json: bool) -> Result<String, Box<dyn std::error::Error>> {
    if json {
        to_json(outcome)
    } else {
        Ok(format_save_outcome(outcome))
    }
}

/// Handle `faqsync models show`
pub async fn handle_models_show(
    args: &ModelsShowArgs,
    ctx: &AppContext,
) -> Result<String, Box<dyn std::error::Error>> {
    let sync = ctx.sync()?;
    let view = sync.worker_configurations(args.refresh).await;

    if args.json {
        to_json(&view)
    } else {
        Ok(format_model_configurations(&view))
    }
}

/// Handle `faqsync models current`
pub async fn handle_models_current(
    args: &JsonArgs,
    ctx: &AppContext,
) -> Result<String, Box<dyn std::error::Error>> {
    let prober = ctx.prober()?;
    let summary = prober.check_all(&ctx.registry).await;

    if args.json {
        let models: BTreeMap<_, _> = summary
            .results
            .iter()
            .map(|p| (p.worker_id.as_str(), &p.model))
            .collect();
        to_json(&models)
    } else {
        Ok(format_current_models(&summary))
    }
}

/// Handle `faqsync models set`
pub async fn handle_models_set(
    args: &ModelsSetArgs,
    ctx: &AppContext,
) -> Result<String, Box<dyn std::error::Error>> {
    let submissions = parse_assignments(&args.assignments)?;
    let outcome = ctx.sync()?.save_model_mapping(&submissions).await?;
    render_outcome(&outcome, args.json)
}

/// Handle `faqsync models reset`
pub async fn handle_models_reset(
    args: &JsonArgs,
    ctx: &AppContext,
) -> Result<String, Box<dyn std::error::Error>> {
    let outcome = ctx.sync()?.reset_models().await?;
    render_outcome(&outcome, args.json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::registry::Registry;
    use std::sync::Arc;

    fn unconfigured_context() -> AppContext {
        AppContext {
            config: SyncConfig::default(),
            registry: Arc::new(Registry::new()),
        }
    }

    #[test]
    fn test_parse_assignments() {
        let parsed = parse_assignments(&[
            "seo_analyzer=@cf/google/gemma-3-12b-it".to_string(),
            " answer_generator = @cf/meta/llama-3.1-8b-instruct ".to_string(),
        ])
        .unwrap();
        assert_eq!(parsed["seo_analyzer"], "@cf/google/gemma-3-12b-it");
        assert_eq!(parsed["answer_generator"], "@cf/meta/llama-3.1-8b-instruct");
    }

    #[test]
    fn test_parse_assignments_last_wins() {
        let parsed = parse_assignments(&[
            "seo_analyzer=@cf/a/one".to_string(),
            "seo_analyzer=@cf/a/two".to_string(),
        ])
        .unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed["seo_analyzer"], "@cf/a/two");
    }

    #[test]
    fn test_parse_assignments_rejects_missing_separator() {
        assert!(parse_assignments(&["seo_analyzer".to_string()]).is_err());
        assert!(parse_assignments(&["=@cf/a/b".to_string()]).is_err());
    }

    #[tokio::test]
    async fn test_models_show_defaults_when_unconfigured() {
        let ctx = unconfigured_context();
        let args = ModelsShowArgs {
            refresh: false,
            json: true,
        };
        let output = handle_models_show(&args, &ctx).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["seo_analyzer"]["data_source"], "defaults_only");
        assert_eq!(parsed["seo_analyzer"]["is_custom"], false);
    }

    #[tokio::test]
    async fn test_models_set_requires_credentials() {
        let ctx = unconfigured_context();
        let args = ModelsSetArgs {
            assignments: vec!["seo_analyzer=@cf/google/gemma-3-12b-it".to_string()],
            json: false,
        };
        let err = handle_models_set(&args, &ctx).await.unwrap_err();
        assert!(err.to_string().contains("not configured") || err.to_string().contains("credentials"));
    }
}
