//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod container_runtime_port;
mod readiness_probe_port;
mod smoke_check;

#[cfg(test)]
pub use container_runtime_port::MockContainerRuntimePort;
pub use container_runtime_port::{ContainerRuntimePort, StartedContainer};
#[cfg(test)]
pub use readiness_probe_port::MockReadinessProbePort;
pub use readiness_probe_port::ReadinessProbePort;
#[cfg(test)]
pub use smoke_check::MockSmokeCheck;
pub use smoke_check::SmokeCheck;
