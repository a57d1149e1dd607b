//! Running instance entity
//!
//! A container started for one `ServiceSpec`. The address only becomes
//! readable once the instance has been marked ready.

use crate::entities::ServiceSpec;
use crate::errors::DomainError;
use crate::value_objects::{InstanceAddress, Readiness, ServiceKind};

/// A provisioned instance of a backing service
#[derive(Debug, Clone)]
pub struct RunningInstance {
    spec: ServiceSpec,
    container_id: String,
    readiness: Readiness,
    address: Option<InstanceAddress>,
}

impl RunningInstance {
    /// Record a freshly started container that is not yet ready
    pub fn starting(spec: ServiceSpec, container_id: impl Into<String>) -> Self {
        Self {
            spec,
            container_id: container_id.into(),
            readiness: Readiness::Starting,
            address: None,
        }
    }

    /// Publish the address and move to `Ready`
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless the instance is `Starting`.
    pub fn mark_ready(&mut self, address: InstanceAddress) -> Result<(), DomainError> {
        self.transition(Readiness::Ready)?;
        self.address = Some(address);
        Ok(())
    }

    /// Move to `Released` and forget the address
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` if already released.
    pub fn mark_released(&mut self) -> Result<(), DomainError> {
        self.transition(Readiness::Released)?;
        self.address = None;
        Ok(())
    }

    fn transition(&mut self, next: Readiness) -> Result<(), DomainError> {
        if !self.readiness.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                service: self.spec.name().to_string(),
                from: self.readiness,
                to: next,
            });
        }
        self.readiness = next;
        Ok(())
    }

    /// Address of the instance
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotReady` unless the instance is `Ready`.
    pub fn address(&self) -> Result<&InstanceAddress, DomainError> {
        match (&self.readiness, &self.address) {
            (Readiness::Ready, Some(address)) => Ok(address),
            _ => Err(DomainError::not_ready(self.spec.name(), self.readiness)),
        }
    }

    /// Spec this instance was started from
    #[must_use]
    pub const fn spec(&self) -> &ServiceSpec {
        &self.spec
    }

    /// Service name
    #[must_use]
    pub fn name(&self) -> &str {
        self.spec.name()
    }

    /// Service kind
    #[must_use]
    pub const fn kind(&self) -> ServiceKind {
        self.spec.kind()
    }

    /// Runtime identifier of the container
    #[must_use]
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Current readiness state
    #[must_use]
    pub const fn readiness(&self) -> Readiness {
        self.readiness
    }

    /// Whether the instance is ready
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.readiness, Readiness::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::PortMapping;

    fn redis_address() -> InstanceAddress {
        InstanceAddress::new(
            "localhost",
            vec![PortMapping {
                container_port: 6379,
                host_port: 50000,
            }],
            "redis://localhost:50000",
        )
        .unwrap()
    }

    #[test]
    fn address_unavailable_while_starting() {
        let instance = RunningInstance::starting(ServiceSpec::redis(), "abc123");
        let err = instance.address().unwrap_err();
        assert!(matches!(
            err,
            DomainError::NotReady {
                state: Readiness::Starting,
                ..
            }
        ));
    }

    #[test]
    fn address_available_after_ready() {
        let mut instance = RunningInstance::starting(ServiceSpec::redis(), "abc123");
        instance.mark_ready(redis_address()).unwrap();

        assert!(instance.is_ready());
        assert_eq!(
            instance.address().unwrap().connection_string(),
            "redis://localhost:50000"
        );
    }

    #[test]
    fn release_hides_address() {
        let mut instance = RunningInstance::starting(ServiceSpec::redis(), "abc123");
        instance.mark_ready(redis_address()).unwrap();
        instance.mark_released().unwrap();

        assert_eq!(instance.readiness(), Readiness::Released);
        assert!(instance.address().is_err());
    }

    #[test]
    fn cannot_release_twice() {
        let mut instance = RunningInstance::starting(ServiceSpec::mongo(), "abc123");
        instance.mark_released().unwrap();
        assert!(matches!(
            instance.mark_released(),
            Err(DomainError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn cannot_become_ready_twice() {
        let mut instance = RunningInstance::starting(ServiceSpec::redis(), "abc123");
        instance.mark_ready(redis_address()).unwrap();
        assert!(instance.mark_ready(redis_address()).is_err());
    }

    #[test]
    fn exposes_spec_details() {
        let instance = RunningInstance::starting(ServiceSpec::kafka(), "k1");
        assert_eq!(instance.name(), "kafka");
        assert_eq!(instance.kind(), ServiceKind::Broker);
        assert_eq!(instance.container_id(), "k1");
    }
}
