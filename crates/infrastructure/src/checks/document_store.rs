//! Document store smoke check
//!
//! Validates the connection string only; no client operations are issued.

use application::{CheckError, SmokeCheck};
use async_trait::async_trait;
use domain::{RunningInstance, ServiceKind, has_scheme};

const NAME: &str = "document_store";
const SCHEME: &str = "mongodb://";

/// Asserts the document store advertises a `mongodb://` connection string
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentStoreCheck;

#[async_trait]
impl SmokeCheck for DocumentStoreCheck {
    fn name(&self) -> &'static str {
        NAME
    }

    fn kind(&self) -> ServiceKind {
        ServiceKind::DocumentStore
    }

    async fn run(&self, instance: &RunningInstance) -> Result<(), CheckError> {
        let connection_string = instance.address()?.connection_string();
        if has_scheme(connection_string, SCHEME) {
            Ok(())
        } else {
            Err(CheckError::assertion(
                NAME,
                format!("connection string {connection_string:?} does not start with {SCHEME}"),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{InstanceAddress, PortMapping, ServiceSpec};

    fn ready_instance(connection_string: &str) -> RunningInstance {
        let mut instance = RunningInstance::starting(ServiceSpec::mongo(), "m");
        instance
            .mark_ready(
                InstanceAddress::new(
                    "localhost",
                    vec![PortMapping {
                        container_port: 27017,
                        host_port: 32768,
                    }],
                    connection_string,
                )
                .unwrap(),
            )
            .unwrap();
        instance
    }

    #[tokio::test]
    async fn accepts_mongodb_scheme() {
        let instance = ready_instance("mongodb://localhost:32768");
        assert!(DocumentStoreCheck.run(&instance).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_other_scheme() {
        let instance = ready_instance("postgres://localhost:32768");
        let err = DocumentStoreCheck.run(&instance).await.unwrap_err();
        assert!(matches!(err, CheckError::Assertion { .. }));
    }

    #[tokio::test]
    async fn refuses_instance_that_is_not_ready() {
        let instance = RunningInstance::starting(ServiceSpec::mongo(), "m");
        assert!(DocumentStoreCheck.run(&instance).await.is_err());
    }
}
