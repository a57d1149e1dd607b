//! Container lifecycle adapters.
//!
//! Starts the backing services through testcontainers and probes them until
//! they accept client connections.
//!
//! # Example
//!
//! ```ignore
//! use infrastructure::containers::{ServiceProbe, TestcontainersRuntime};
//!
//! let provisioner = Provisioner::new(
//!     Arc::new(TestcontainersRuntime::default()),
//!     Arc::new(ServiceProbe::default()),
//! );
//! let mut environment = provisioner.start(vec![ServiceSpec::redis()]).await?;
//! // ...
//! provisioner.stop(&mut environment).await;
//! ```

mod probe;
mod runtime;

pub use probe::ServiceProbe;
pub use runtime::TestcontainersRuntime;
