//! Wiring of the container adapters, checks and configuration into a suite

use std::sync::Arc;

use application::{ProvisionError, Provisioner, SmokeSuite, SuiteReport};
use domain::{DomainError, ServiceSpec};
use thiserror::Error;
use tracing::{info, instrument};

use crate::{
    checks,
    config::HarnessConfig,
    containers::{ServiceProbe, TestcontainersRuntime},
};

/// Errors that abort a harness run before any report exists
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Configured service set is invalid
    #[error("Invalid service configuration: {0}")]
    Config(#[from] DomainError),

    /// Provisioning failed
    #[error(transparent)]
    Provision(#[from] ProvisionError),
}

/// Build a suite backed by testcontainers with a check for every spec kind
#[must_use]
pub fn build_suite(config: &HarnessConfig, specs: &[ServiceSpec]) -> SmokeSuite {
    let runtime = TestcontainersRuntime::new(config.provisioner.startup_timeout());
    let provisioner = Provisioner::new(Arc::new(runtime), Arc::new(ServiceProbe::default()))
        .with_config(config.provisioner.to_provisioner_config());

    checks::all()
        .into_iter()
        .filter(|check| specs.iter().any(|spec| spec.kind() == check.kind()))
        .fold(SmokeSuite::new(provisioner), SmokeSuite::with_check)
        .with_check_timeout(config.provisioner.check_timeout())
}

/// Provision every enabled service, run the matching checks and tear down
#[instrument(skip_all)]
pub async fn run_smoke_suite(config: &HarnessConfig) -> Result<SuiteReport, HarnessError> {
    let specs = config.service_specs()?;
    info!(services = specs.len(), "Starting smoke suite");
    let suite = build_suite(config, &specs);
    Ok(suite.run(specs).await?)
}
