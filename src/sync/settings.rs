//! Fleet-wide settings stored under `global_settings`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSettings {
    #[serde(rename = "enableRateLimiting")]
    pub enable_rate_limiting: bool,
    #[serde(rename = "enableIPWhitelist")]
    pub enable_ip_whitelist: bool,
    #[serde(rename = "enableIPBlacklist")]
    pub enable_ip_blacklist: bool,
    #[serde(rename = "enableViolationTracking")]
    pub enable_violation_tracking: bool,
    #[serde(rename = "enableAnalytics")]
    pub enable_analytics: bool,
    #[serde(
        rename = "adminNotificationEmail",
        skip_serializing_if = "Option::is_none"
    )]
    pub admin_notification_email: Option<String>,
    #[serde(rename = "notifyOnViolations")]
    pub notify_on_violations: bool,
    #[serde(rename = "violationNotificationThreshold")]
    pub violation_notification_threshold: u32,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            enable_rate_limiting: true,
            enable_ip_whitelist: true,
            enable_ip_blacklist: true,
            enable_violation_tracking: true,
            enable_analytics: true,
            admin_notification_email: None,
            notify_on_violations: true,
            violation_notification_threshold: 5,
        }
    }
}
