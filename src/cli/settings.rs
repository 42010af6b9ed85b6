//! Global settings command handlers

use crate::cli::output::to_json;
use crate::cli::{AppContext, JsonArgs};
use crate::sync::GlobalSettings;
use comfy_table::{presets::UTF8_FULL, Cell, Table};

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

/// Format global settings as a table
pub fn format_settings(settings: &GlobalSettings) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Setting", "Value"]);

    let rows = [
        ("Rate limiting", on_off(settings.enable_rate_limiting).to_string()),
        ("IP whitelist", on_off(settings.enable_ip_whitelist).to_string()),
        ("IP blacklist", on_off(settings.enable_ip_blacklist).to_string()),
        (
            "Violation tracking",
            on_off(settings.enable_violation_tracking).to_string(),
        ),
        ("Analytics", on_off(settings.enable_analytics).to_string()),
        (
            "Admin email",
            settings
                .admin_notification_email
                .clone()
                .unwrap_or_else(|| "-".to_string()),
        ),
        (
            "Notify on violations",
            on_off(settings.notify_on_violations).to_string(),
        ),
        (
            "Notification threshold",
            settings.violation_notification_threshold.to_string(),
        ),
    ];
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(value)]);
    }

    table.to_string()
}

/// Handle `faqsync settings show`
pub async fn handle_settings_show(
    args: &JsonArgs,
    ctx: &AppContext,
) -> Result<String, Box<dyn std::error::Error>> {
    let settings = ctx.sync()?.global_settings(false).await?;

    if args.json {
        to_json(&settings)
    } else {
        Ok(format_settings(&settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_settings_defaults() {
        let output = format_settings(&GlobalSettings::default());
        assert!(output.contains("Rate limiting"));
        assert!(output.contains("Notification threshold"));
        assert!(output.contains('5'));
    }
}
