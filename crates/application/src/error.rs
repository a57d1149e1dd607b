//! Application-level errors

use domain::{DomainError, ServiceKind};
use thiserror::Error;

/// Errors reported by the container runtime and readiness probe ports
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Container failed to start
    #[error("Container failed to start: {0}")]
    Start(String),

    /// Failed to connect to container
    #[error("Failed to connect to container: {0}")]
    Connection(String),

    /// Container health check failed
    #[error("Container health check failed: {0}")]
    HealthCheck(String),

    /// Container could not be stopped or removed
    #[error("Failed to stop container: {0}")]
    Stop(String),
}

/// Fatal provisioning failures; no check runs after one of these
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// A container failed to start
    #[error("Service {service} failed to start: {reason}")]
    Start { service: String, reason: String },

    /// A container did not become ready in time
    #[error("Service {service} not ready after {timeout_secs}s")]
    ReadinessTimeout { service: String, timeout_secs: u64 },

    /// Two specs share a name
    #[error("Duplicate service name: {0}")]
    DuplicateService(String),

    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ProvisionError {
    /// Name of the service that caused the failure, if known
    #[must_use]
    pub fn service(&self) -> Option<&str> {
        match self {
            Self::Start { service, .. } | Self::ReadinessTimeout { service, .. } => Some(service),
            Self::DuplicateService(service) => Some(service),
            Self::Domain(_) => None,
        }
    }
}

/// Per-check failures; siblings keep running
#[derive(Debug, Error)]
pub enum CheckError {
    /// An expectation did not hold
    #[error("{check}: assertion failed: {message}")]
    Assertion { check: String, message: String },

    /// The service client returned an error
    #[error("{check}: client error: {message}")]
    Client { check: String, message: String },

    /// No provisioned instance matches the check's kind
    #[error("No instance of kind {0} was provisioned")]
    MissingInstance(ServiceKind),

    /// The check did not finish in time
    #[error("{check}: timed out after {timeout_secs}s")]
    TimedOut { check: String, timeout_secs: u64 },

    /// The instance could not be read
    #[error(transparent)]
    Instance(#[from] DomainError),
}

impl CheckError {
    /// Create an assertion failure
    pub fn assertion(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Assertion {
            check: check.into(),
            message: message.into(),
        }
    }

    /// Create a client failure
    pub fn client(check: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Client {
            check: check.into(),
            message: message.to_string(),
        }
    }
}
