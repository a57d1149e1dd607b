//! Smoke check port
//!
//! One implementation per service kind; each opens its own client against
//! a ready instance and asserts a trivial result.

use async_trait::async_trait;
use domain::{RunningInstance, ServiceKind};
#[cfg(test)]
use mockall::automock;

use crate::error::CheckError;

/// A minimal reachability check against one running instance
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SmokeCheck: Send + Sync {
    /// Short name used in reports
    fn name(&self) -> &'static str;

    /// Kind of instance this check runs against
    fn kind(&self) -> ServiceKind;

    /// Run the check; must release any client it opens before returning
    async fn run(&self, instance: &RunningInstance) -> Result<(), CheckError>;
}
