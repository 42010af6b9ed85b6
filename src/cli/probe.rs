//! Probe command handlers

use crate::cli::output::{format_probe_detail, format_probe_summary, to_json};
use crate::cli::{AppContext, JsonArgs, ProbeArgs, WatchArgs};
use crate::health::Prober;
use crate::registry::WorkerEndpoint;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Resolve the endpoint a `probe` invocation targets.
fn probe_target(args: &ProbeArgs, ctx: &AppContext) -> Result<WorkerEndpoint, Box<dyn std::error::Error>> {
    match (&args.worker, &args.url) {
        (Some(id), Some(url)) => Ok(WorkerEndpoint::new(id.clone(), url, true, 0)),
        (None, Some(url)) => Ok(WorkerEndpoint::new("adhoc", url, true, 0)),
        (Some(id), None) => ctx
            .registry
            .get_worker(id)
            .ok_or_else(|| format!("Worker not found: {}", id).into()),
        (None, None) => Err("Specify a worker id or --url".into()),
    }
}

/// Handle `faqsync probe`
pub async fn handle_probe(
    args: &ProbeArgs,
    ctx: &AppContext,
) -> Result<String, Box<dyn std::error::Error>> {
    let worker = probe_target(args, ctx)?;
    let prober = ctx.prober()?;
    let probe = prober.probe_with_model(&worker).await;

    if args.json {
        to_json(&probe)
    } else {
        Ok(format_probe_detail(&probe))
    }
}

/// Handle `faqsync probe-all`
pub async fn handle_probe_all(
    args: &JsonArgs,
    ctx: &AppContext,
) -> Result<String, Box<dyn std::error::Error>> {
    let prober = ctx.prober()?;
    let summary = prober.check_all(&ctx.registry).await;

    if args.json {
        to_json(&summary)
    } else {
        Ok(format_probe_summary(&summary))
    }
}

/// Handle `faqsync watch`: run the scheduled prober and print every cycle
/// until Ctrl-C.
pub async fn handle_watch(
    args: &WatchArgs,
    ctx: &AppContext,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut config = ctx.config.probe.clone();
    if let Some(interval) = args.interval {
        config.interval_seconds = interval;
    }

    let (tx, mut rx) = broadcast::channel(4);
    let cancel_token = CancellationToken::new();
    let prober = Prober::new(config)?.with_broadcast(tx);
    let handle = prober.start(ctx.registry.clone(), cancel_token.clone());

    let mut cycles = 0usize;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl-C, stopping watch");
                break;
            }
            received = rx.recv() => match received {
                Ok(summary) => {
                    cycles += 1;
                    println!("{}\n", format_probe_summary(&summary));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Watch output fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    cancel_token.cancel();
    handle.await?;
    Ok(format!("Stopped after {} probe cycles", cycles))
}
