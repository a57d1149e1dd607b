//! Application services - Use case implementations

mod provisioner;
mod readiness_policy;
mod smoke_suite;

pub use provisioner::{Environment, Provisioner, ProvisionerConfig, TeardownSummary};
pub use readiness_policy::ReadinessPolicy;
pub use smoke_suite::{CheckReport, SmokeSuite, SuiteReport};
