//! Per-worker rate-limit settings.

use serde::{Deserialize, Serialize};

/// Violation counts that escalate a client's penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViolationThresholds {
    pub soft: u32,
    pub hard: u32,
    pub ban: u32,
}

impl Default for ViolationThresholds {
    fn default() -> Self {
        Self {
            soft: 3,
            hard: 6,
            ban: 12,
        }
    }
}

impl ViolationThresholds {
    fn is_ascending(&self) -> bool {
        self.soft > 0 && self.soft < self.hard && self.hard < self.ban
    }
}

/// The blob stored under `worker_config_<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    #[serde(rename = "hourlyLimit", alias = "hourly")]
    pub hourly: u32,
    #[serde(rename = "dailyLimit", alias = "daily")]
    pub daily: u32,
    #[serde(rename = "weeklyLimit", alias = "weekly")]
    pub weekly: u32,
    #[serde(rename = "monthlyLimit", alias = "monthly")]
    pub monthly: u32,
    #[serde(rename = "violationThresholds", alias = "violation_thresholds")]
    pub violation_thresholds: ViolationThresholds,
    pub enabled: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            hourly: 100,
            daily: 500,
            weekly: 2000,
            monthly: 5000,
            violation_thresholds: ViolationThresholds::default(),
            enabled: true,
        }
    }
}

impl RateLimitConfig {
    /// Replace unusable values with defaults.
    ///
    /// Zero limits fall back individually; thresholds that are not strictly
    /// ascending fall back as a group. Returns the names of replaced fields.
    pub fn normalize(&mut self) -> Vec<&'static str> {
        let defaults = Self::default();
        let mut replaced = Vec::new();

        for (name, value, default) in [
            ("hourly", &mut self.hourly, defaults.hourly),
            ("daily", &mut self.daily, defaults.daily),
            ("weekly", &mut self.weekly, defaults.weekly),
            ("monthly", &mut self.monthly, defaults.monthly),
        ] {
            if *value == 0 {
                *value = default;
                replaced.push(name);
            }
        }

        if !self.violation_thresholds.is_ascending() {
            self.violation_thresholds = defaults.violation_thresholds;
            replaced.push("violation_thresholds");
        }

        replaced
    }
}
