//! Harness configuration
//!
//! Split into focused sub-modules:
//! - `provisioner`: startup, polling and check timeouts
//! - `services`: per-service image, credential and toggle settings
//!
//! Values come from serde defaults overridden by `HARNESS__*` environment
//! variables, e.g. `HARNESS__POSTGRES__TAG=16-alpine`.

mod provisioner;
mod services;

use domain::{DomainError, ServiceSpec};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::telemetry::TelemetryConfig;

pub use provisioner::ProvisionerSettings;
pub use services::{PostgresServiceConfig, ServiceImageConfig};

const ENV_PREFIX: &str = "HARNESS";
const ENV_SEPARATOR: &str = "__";

/// Shared default for boolean `true` fields across config structs
pub(crate) const fn default_true() -> bool {
    true
}

/// Top-level harness configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Provisioning and check timing
    #[serde(default)]
    pub provisioner: ProvisionerSettings,

    /// Relational database
    #[serde(default)]
    pub postgres: PostgresServiceConfig,

    /// Key-value cache
    #[serde(default)]
    pub redis: ServiceImageConfig,

    /// Document store
    #[serde(default)]
    pub mongo: ServiceImageConfig,

    /// Message broker
    #[serde(default)]
    pub kafka: ServiceImageConfig,

    /// Logging
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl HarnessConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::build(env_source())
    }

    /// Load configuration from an explicit variable map instead of the process environment
    pub fn load_from(vars: config::Map<String, String>) -> Result<Self, config::ConfigError> {
        Self::build(env_source().source(Some(vars)))
    }

    fn build(source: config::Environment) -> Result<Self, config::ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        debug!(
            startup_timeout_secs = config.provisioner.startup_timeout_secs,
            check_timeout_secs = config.provisioner.check_timeout_secs,
            "Harness configuration loaded"
        );
        Ok(config)
    }

    /// Specs for every enabled service, in relational, cache, document, broker order
    pub fn service_specs(&self) -> Result<Vec<ServiceSpec>, DomainError> {
        let specs = [
            self.postgres.to_spec()?,
            self.redis.apply(ServiceSpec::redis())?,
            self.mongo.apply(ServiceSpec::mongo())?,
            self.kafka.apply(ServiceSpec::kafka())?,
        ];
        Ok(specs.into_iter().flatten().collect())
    }
}

fn env_source() -> config::Environment {
    // Values stay strings until serde asks for a number or bool, so tags
    // like `6.0` and passwords like `0123` survive unchanged.
    config::Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR)
}
