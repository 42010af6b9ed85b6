//! Rate-limit command handlers

use crate::cli::output::{format_rate_limits, to_json};
use crate::cli::{AppContext, RateLimitsSetArgs, RateLimitsShowArgs, WorkerArg};
use crate::sync::RateLimitConfig;
use colored::Colorize;

/// Apply the flags given on the command line over `current`.
pub fn apply_overrides(mut current: RateLimitConfig, args: &RateLimitsSetArgs) -> RateLimitConfig {
    let thresholds = &mut current.violation_thresholds;
    for (target, value) in [
        (&mut thresholds.soft, args.soft),
        (&mut thresholds.hard, args.hard),
        (&mut thresholds.ban, args.ban),
    ] {
        if let Some(value) = value {
            *target = value;
        }
    }
    for (target, value) in [
        (&mut current.hourly, args.hourly),
        (&mut current.daily, args.daily),
        (&mut current.weekly, args.weekly),
        (&mut current.monthly, args.monthly),
    ] {
        if let Some(value) = value {
            *target = value;
        }
    }
    if let Some(enabled) = args.enabled {
        current.enabled = enabled;
    }
    current
}

/// Handle `faqsync rate-limits show`
pub async fn handle_rate_limits_show(
    args: &RateLimitsShowArgs,
    ctx: &AppContext,
) -> Result<String, Box<dyn std::error::Error>> {
    let config = ctx.sync()?.rate_limits(&args.worker, args.refresh).await?;

    if args.json {
        to_json(&config)
    } else {
        Ok(format_rate_limits(&args.worker, &config))
    }
}

/// Handle `faqsync rate-limits set`
///
/// Reads the stored values first so unspecified flags keep their value.
pub async fn handle_rate_limits_set(
    args: &RateLimitsSetArgs,
    ctx: &AppContext,
) -> Result<String, Box<dyn std::error::Error>> {
    let sync = ctx.sync()?;
    let current = sync.rate_limits(&args.worker, true).await?;
    let requested = apply_overrides(current, args);
    let saved = sync.save_rate_limits(&args.worker, requested.clone()).await?;

    let mut output = format!("{} Rate limits saved for {}\n", "✓".green(), args.worker);
    if saved != requested {
        output.push_str(&format!(
            "{}\n",
            "Some values were invalid and were replaced with defaults.".yellow()
        ));
    }
    output.push_str(&format_rate_limits(&args.worker, &saved));
    Ok(output)
}

/// Handle `faqsync rate-limits reset`
pub async fn handle_rate_limits_reset(
    args: &WorkerArg,
    ctx: &AppContext,
) -> Result<String, Box<dyn std::error::Error>> {
    let saved = ctx.sync()?.reset_rate_limits(&args.worker).await?;
    Ok(format!(
        "{} Rate limits reset for {}\n{}",
        "✓".green(),
        args.worker,
        format_rate_limits(&args.worker, &saved)
    ))
}
