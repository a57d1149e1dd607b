//! Container runtime port
//!
//! Starts and stops containers for service specs and reports where they
//! can be reached.

use async_trait::async_trait;
use domain::{InstanceAddress, ServiceSpec};
#[cfg(test)]
use mockall::automock;

use crate::error::RuntimeError;

/// A container the runtime has started
#[derive(Debug, Clone)]
pub struct StartedContainer {
    /// Runtime identifier used to stop the container later
    pub container_id: String,
    /// Host, mapped ports and connection string
    pub address: InstanceAddress,
}

/// Port for container lifecycle operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ContainerRuntimePort: Send + Sync {
    /// Start a container for `spec` and resolve its mapped address.
    ///
    /// The container may not accept connections yet.
    async fn start(&self, spec: &ServiceSpec) -> Result<StartedContainer, RuntimeError>;

    /// Stop and remove a container.
    ///
    /// Stopping an unknown or already removed container succeeds.
    async fn stop(&self, container_id: &str) -> Result<(), RuntimeError>;
}
