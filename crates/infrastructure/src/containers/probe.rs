//! Kind-specific readiness probes.
//!
//! PostgreSQL must answer `SELECT 1` and Redis must answer `PING`; the
//! document store and broker only need to accept a TCP connection.

use std::time::Duration;

use application::{ReadinessProbePort, RuntimeError};
use async_trait::async_trait;
use domain::{InstanceAddress, ServiceKind};
use sqlx::{Connection, PgConnection};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// Default bound on a single probe attempt
const DEFAULT_ATTEMPT_TIMEOUT_MS: u64 = 2_000;

/// Readiness probe speaking each service's own client protocol where cheap
#[derive(Debug, Clone)]
pub struct ServiceProbe {
    attempt_timeout: Duration,
}

impl Default for ServiceProbe {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_ATTEMPT_TIMEOUT_MS))
    }
}

impl ServiceProbe {
    /// Create a probe whose single attempts are bounded by `attempt_timeout`
    #[must_use]
    pub const fn new(attempt_timeout: Duration) -> Self {
        Self { attempt_timeout }
    }

    async fn probe_postgres(address: &InstanceAddress) -> Result<(), RuntimeError> {
        let mut conn = PgConnection::connect(address.connection_string())
            .await
            .map_err(|e| RuntimeError::Connection(e.to_string()))?;
        let outcome = sqlx::query("SELECT 1")
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| RuntimeError::HealthCheck(e.to_string()));
        if let Err(e) = conn.close().await {
            trace!(error = %e, "Failed to close probe connection");
        }
        outcome
    }

    async fn probe_redis(address: &InstanceAddress) -> Result<(), RuntimeError> {
        let client = redis::Client::open(address.connection_string())
            .map_err(|e| RuntimeError::Connection(e.to_string()))?;
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| RuntimeError::Connection(e.to_string()))?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| RuntimeError::HealthCheck(e.to_string()))?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(RuntimeError::HealthCheck(format!(
                "unexpected PING reply: {pong}"
            )))
        }
    }

    async fn probe_tcp(address: &InstanceAddress) -> Result<(), RuntimeError> {
        TcpStream::connect((address.host(), address.primary_port()))
            .await
            .map(|_| ())
            .map_err(|e| RuntimeError::Connection(e.to_string()))
    }
}

#[async_trait]
impl ReadinessProbePort for ServiceProbe {
    async fn probe(
        &self,
        kind: ServiceKind,
        address: &InstanceAddress,
    ) -> Result<(), RuntimeError> {
        trace!(kind = %kind, address = %address, "Probing service");

        let attempt = async {
            match kind {
                ServiceKind::RelationalDb => Self::probe_postgres(address).await,
                ServiceKind::KvCache => Self::probe_redis(address).await,
                ServiceKind::DocumentStore | ServiceKind::Broker => Self::probe_tcp(address).await,
            }
        };

        timeout(self.attempt_timeout, attempt).await.map_err(|_| {
            RuntimeError::HealthCheck(format!(
                "probe timed out after {}ms",
                self.attempt_timeout.as_millis()
            ))
        })?
    }
}
