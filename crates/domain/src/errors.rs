//! Domain-level errors

use thiserror::Error;

use crate::value_objects::Readiness;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed container image reference
    #[error("Invalid image reference: {0}")]
    InvalidImageReference(String),

    /// Service spec failed validation
    #[error("Invalid service spec: {0}")]
    InvalidSpec(String),

    /// Malformed instance address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Address read before the instance became ready
    #[error("Service {service} is not ready (state: {state})")]
    NotReady { service: String, state: Readiness },

    /// Readiness state machine violation
    #[error("Service {service} cannot move from {from} to {to}")]
    InvalidTransition {
        service: String,
        from: Readiness,
        to: Readiness,
    },
}

impl DomainError {
    /// Create a not-ready error
    pub fn not_ready(service: impl Into<String>, state: Readiness) -> Self {
        Self::NotReady {
            service: service.into(),
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_ready_creates_correct_error() {
        let err = DomainError::not_ready("postgres", Readiness::Starting);
        match err {
            DomainError::NotReady { service, state } => {
                assert_eq!(service, "postgres");
                assert_eq!(state, Readiness::Starting);
            },
            _ => unreachable!("Expected NotReady error"),
        }
    }

    #[test]
    fn not_ready_error_message() {
        let err = DomainError::not_ready("redis", Readiness::Released);
        assert_eq!(err.to_string(), "Service redis is not ready (state: released)");
    }

    #[test]
    fn invalid_transition_error_message() {
        let err = DomainError::InvalidTransition {
            service: "mongo".to_string(),
            from: Readiness::Released,
            to: Readiness::Ready,
        };
        assert_eq!(
            err.to_string(),
            "Service mongo cannot move from released to ready"
        );
    }

    #[test]
    fn invalid_image_error_message() {
        let err = DomainError::InvalidImageReference("image name is empty".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid image reference: image name is empty"
        );
    }
}
