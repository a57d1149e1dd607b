//! Application layer - Provisioning and smoke-check orchestration
//!
//! Defines the ports a container runtime, readiness probe and smoke checks
//! must implement, and the services that drive them.

pub mod error;
pub mod ports;
pub mod services;

pub use error::{CheckError, ProvisionError, RuntimeError};
pub use ports::*;
pub use services::*;
