//! Tunable guard limits.

use serde::{Deserialize, Serialize};

/// Rate-window limits applied by the guards.
///
/// Every field has a default so a partial `[guard]` table in the config file
/// only overrides what it names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardPolicy {
    /// Accepted confessions per IP inside `daily_window_secs`.
    pub max_per_ip_daily: u32,
    /// Accepted confessions per device fingerprint inside `daily_window_secs`.
    pub max_per_device_daily: u32,
    /// Minimum spacing between submissions from one IP or device.
    pub cooldown_secs: u64,
    pub daily_window_secs: u64,
    /// Claim attempts per IP inside `unlock_window_secs`.
    pub max_unlock_attempts: u64,
    pub unlock_window_secs: u64,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            max_per_ip_daily: 3,
            max_per_device_daily: 2,
            cooldown_secs: 10 * 60,
            daily_window_secs: 24 * 60 * 60,
            max_unlock_attempts: 30,
            unlock_window_secs: 60 * 60,
        }
    }
}

impl GuardPolicy {
    /// The widest window any submission check looks back over.
    pub fn lookback_secs(&self) -> u64 {
        self.daily_window_secs.max(self.cooldown_secs)
    }

    pub fn daily_window_hours(&self) -> u64 {
        self.daily_window_secs / 3600
    }

    pub fn cooldown_minutes(&self) -> u64 {
        self.cooldown_secs / 60
    }
}
