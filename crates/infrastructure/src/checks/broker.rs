//! Message broker smoke check
//!
//! Validates the bootstrap address only; nothing is produced or consumed.

use application::{CheckError, SmokeCheck};
use async_trait::async_trait;
use domain::{RunningInstance, ServiceKind, is_bootstrap_address};

const NAME: &str = "broker";

/// Asserts the broker advertises a `host:port` bootstrap address
#[derive(Debug, Clone, Copy, Default)]
pub struct BrokerCheck;

#[async_trait]
impl SmokeCheck for BrokerCheck {
    fn name(&self) -> &'static str {
        NAME
    }

    fn kind(&self) -> ServiceKind {
        ServiceKind::Broker
    }

    async fn run(&self, instance: &RunningInstance) -> Result<(), CheckError> {
        let bootstrap = instance.address()?.connection_string();
        if is_bootstrap_address(bootstrap) {
            Ok(())
        } else {
            Err(CheckError::assertion(
                NAME,
                format!("bootstrap address {bootstrap:?} has no host:port separator"),
            ))
        }
    }
}
