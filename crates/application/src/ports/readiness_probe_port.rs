//! Readiness probe port

use async_trait::async_trait;
use domain::{InstanceAddress, ServiceKind};
#[cfg(test)]
use mockall::automock;

use crate::error::RuntimeError;

/// Port for a single readiness probe attempt
///
/// The provisioner calls this repeatedly until it succeeds or the startup
/// timeout elapses; implementations should not retry internally.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReadinessProbePort: Send + Sync {
    /// Return `Ok` once the service at `address` accepts client connections
    async fn probe(
        &self,
        kind: ServiceKind,
        address: &InstanceAddress,
    ) -> Result<(), RuntimeError>;
}
