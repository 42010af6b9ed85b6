//! KV store command handlers

use crate::cli::{AppContext, KvGetArgs, KvKeyArgs};
use crate::kv::ConfigurationStore;
use colored::Colorize;

/// Handle `faqsync kv test`
pub async fn handle_kv_test(ctx: &AppContext) -> Result<String, Box<dyn std::error::Error>> {
    ctx.kv_client()?.verify().await?;
    Ok(format!(
        "{} KV namespace {} is reachable",
        "✓".green(),
        ctx.config.kv.namespace_id
    ))
}

/// Handle `faqsync kv get`
pub async fn handle_kv_get(
    args: &KvGetArgs,
    ctx: &AppContext,
) -> Result<String, Box<dyn std::error::Error>> {
    match ctx.kv_client()?.get(&args.key, args.refresh).await? {
        Some(value) => Ok(serde_json::to_string_pretty(&value)?),
        None => Err(format!("Key not found: {}", args.key).into()),
    }
}

/// Handle `faqsync kv delete`
pub async fn handle_kv_delete(
    args: &KvKeyArgs,
    ctx: &AppContext,
) -> Result<String, Box<dyn std::error::Error>> {
    ctx.kv_client()?.delete(&args.key).await?;
    Ok(format!("{} Deleted {}", "✓".green(), args.key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::registry::Registry;
    use mockito::Server;
    use std::sync::Arc;

    fn context(api_base: &str) -> AppContext {
        let mut config = SyncConfig::default();
        config.kv.api_base = api_base.to_string();
        config.kv.account_id = "acct".to_string();
        config.kv.namespace_id = "ns".to_string();
        config.kv.api_token = Some("secret".to_string());
        AppContext {
            config,
            registry: Arc::new(Registry::new()),
        }
    }

    #[tokio::test]
    async fn test_kv_test_reports_reachable() {
        let mut server = Server::new_async().await;
        let _ns = server
            .mock("GET", "/accounts/acct/storage/kv/namespaces/ns")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_body(r#"{"success":true}"#)
            .create_async()
            .await;

        let output = handle_kv_test(&context(&server.url())).await.unwrap();
        assert!(output.contains("reachable"));
    }

    #[tokio::test]
    async fn test_kv_get_missing_key() {
        let mut server = Server::new_async().await;
        let _missing = server
            .mock("GET", "/accounts/acct/storage/kv/namespaces/ns/values/global_settings")
            .with_status(404)
            .create_async()
            .await;

        let args = KvGetArgs {
            key: "global_settings".to_string(),
            refresh: true,
        };
        let err = handle_kv_get(&args, &context(&server.url())).await.unwrap_err();
        assert!(err.to_string().contains("Key not found"));
    }

    #[tokio::test]
    async fn test_kv_get_prints_json() {
        let mut server = Server::new_async().await;
        let _value = server
            .mock("GET", "/accounts/acct/storage/kv/namespaces/ns/values/global_settings")
            .with_status(200)
            .with_body(r#"{"enableAnalytics":false}"#)
            .create_async()
            .await;

        let args = KvGetArgs {
            key: "global_settings".to_string(),
            refresh: false,
        };
        let output = handle_kv_get(&args, &context(&server.url())).await.unwrap();
        assert!(output.contains("\"enableAnalytics\": false"));
    }

    #[tokio::test]
    async fn test_kv_test_without_credentials() {
        let ctx = AppContext {
            config: SyncConfig::default(),
            registry: Arc::new(Registry::new()),
        };
        assert!(handle_kv_test(&ctx).await.is_err());
    }
}
