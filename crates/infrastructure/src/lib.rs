//! Infrastructure layer - Adapters for external systems
//!
//! Implements the application ports with testcontainers, PostgreSQL and
//! Redis clients, and wires them together with configuration and logging.

pub mod checks;
pub mod config;
pub mod containers;
pub mod harness;
pub mod telemetry;

pub use checks::{BrokerCheck, CacheCheck, DocumentStoreCheck, RelationalCheck};
pub use config::{HarnessConfig, PostgresServiceConfig, ProvisionerSettings, ServiceImageConfig};
pub use containers::{ServiceProbe, TestcontainersRuntime};
pub use harness::{HarnessError, build_suite, run_smoke_suite};
pub use telemetry::{TelemetryConfig, TelemetryError, init_tracing};
