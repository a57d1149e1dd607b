//! Provisioner and check timing settings.

use std::time::Duration;

use application::{ProvisionerConfig, ReadinessPolicy};
use serde::{Deserialize, Serialize};

/// Timing knobs for provisioning and checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionerSettings {
    /// Per-service readiness bound in seconds (default: 60)
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_secs: u64,

    /// First readiness poll delay in milliseconds (default: 250)
    #[serde(default = "default_poll_initial")]
    pub poll_initial_ms: u64,

    /// Readiness poll delay cap in milliseconds (default: 2000)
    #[serde(default = "default_poll_max")]
    pub poll_max_ms: u64,

    /// Per-check bound in seconds (default: 30)
    #[serde(default = "default_check_timeout")]
    pub check_timeout_secs: u64,
}

const fn default_startup_timeout() -> u64 {
    60
}

const fn default_poll_initial() -> u64 {
    250
}

const fn default_poll_max() -> u64 {
    2_000
}

const fn default_check_timeout() -> u64 {
    30
}

impl Default for ProvisionerSettings {
    fn default() -> Self {
        Self {
            startup_timeout_secs: default_startup_timeout(),
            poll_initial_ms: default_poll_initial(),
            poll_max_ms: default_poll_max(),
            check_timeout_secs: default_check_timeout(),
        }
    }
}

impl ProvisionerSettings {
    /// Application-level provisioner configuration
    #[must_use]
    pub fn to_provisioner_config(&self) -> ProvisionerConfig {
        ProvisionerConfig {
            startup_timeout_secs: self.startup_timeout_secs,
            readiness: ReadinessPolicy::new(self.poll_initial_ms, self.poll_max_ms),
        }
    }

    /// Startup timeout as a duration
    #[must_use]
    pub const fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    /// Check timeout as a duration
    #[must_use]
    pub const fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs)
    }
}
