//! Container runtime backed by testcontainers.
//!
//! Maps each service kind onto its testcontainers module image, applies the
//! spec's image override, credentials and environment, and keeps the live
//! handles until they are stopped.

use std::collections::HashMap;
use std::time::Duration;

use application::{ContainerRuntimePort, RuntimeError, StartedContainer};
use async_trait::async_trait;
use domain::{InstanceAddress, PortMapping, ServiceKind, ServiceSpec};
use parking_lot::Mutex;
use testcontainers::{ContainerAsync, ContainerRequest, Image, ImageExt, runners::AsyncRunner};
use testcontainers_modules::{kafka::Kafka, mongo::Mongo, postgres::Postgres, redis::Redis};
use tracing::{debug, info, warn};

/// Credentials the postgres image falls back to when a spec sets none
const DEFAULT_POSTGRES_USER: &str = "postgres";
const DEFAULT_POSTGRES_PASSWORD: &str = "postgres";
const DEFAULT_POSTGRES_DATABASE: &str = "postgres";

/// A live container of any supported image
enum ManagedContainer {
    Postgres(ContainerAsync<Postgres>),
    Redis(ContainerAsync<Redis>),
    Mongo(ContainerAsync<Mongo>),
    Kafka(ContainerAsync<Kafka>),
}

impl ManagedContainer {
    async fn remove(self) -> Result<(), RuntimeError> {
        let result = match self {
            Self::Postgres(container) => container.rm().await,
            Self::Redis(container) => container.rm().await,
            Self::Mongo(container) => container.rm().await,
            Self::Kafka(container) => container.rm().await,
        };
        result.map_err(|e| RuntimeError::Stop(e.to_string()))
    }
}

/// `ContainerRuntimePort` implementation on top of the local Docker daemon
pub struct TestcontainersRuntime {
    startup_timeout: Duration,
    containers: Mutex<HashMap<String, ManagedContainer>>,
}

impl std::fmt::Debug for TestcontainersRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestcontainersRuntime")
            .field("startup_timeout", &self.startup_timeout)
            .field("live_containers", &self.containers.lock().len())
            .finish()
    }
}

impl Default for TestcontainersRuntime {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl TestcontainersRuntime {
    /// Create a runtime; `startup_timeout` bounds each image's own wait strategy
    #[must_use]
    pub fn new(startup_timeout: Duration) -> Self {
        Self {
            startup_timeout,
            containers: Mutex::new(HashMap::new()),
        }
    }

    /// Number of containers started and not yet stopped
    #[must_use]
    pub fn live_containers(&self) -> usize {
        self.containers.lock().len()
    }

    fn configure<I: Image>(&self, image: I, spec: &ServiceSpec) -> ContainerRequest<I> {
        let mut request: ContainerRequest<I> = image
            .with_name(spec.image().name())
            .with_tag(spec.image().tag())
            .with_startup_timeout(self.startup_timeout);
        for (key, value) in spec.env() {
            request = request.with_env_var(key, value);
        }
        request
    }

    fn postgres_request(&self, spec: &ServiceSpec) -> ContainerRequest<Postgres> {
        let mut image = Postgres::default()
            .with_db_name(spec.database().unwrap_or(DEFAULT_POSTGRES_DATABASE))
            .with_user(
                spec.credentials()
                    .map_or(DEFAULT_POSTGRES_USER, |c| c.username.as_str()),
            )
            .with_password(
                spec.credentials()
                    .map_or(DEFAULT_POSTGRES_PASSWORD, |c| c.password.as_str()),
            );
        if let Some(script) = spec.init_script() {
            image = image.with_init_sql(script.as_bytes().to_vec());
        }
        self.configure(image, spec)
    }

    fn remember(&self, id: &str, container: ManagedContainer) {
        self.containers.lock().insert(id.to_string(), container);
    }
}

/// Start a request and resolve host and mapped ports for every exposed port.
async fn launch<I: Image>(
    request: ContainerRequest<I>,
    spec: &ServiceSpec,
) -> Result<(ContainerAsync<I>, String, Vec<PortMapping>), RuntimeError> {
    let container = request
        .start()
        .await
        .map_err(|e| RuntimeError::Start(e.to_string()))?;

    let host = container
        .get_host()
        .await
        .map_err(|e| RuntimeError::Connection(e.to_string()))?
        .to_string();

    let mut ports = Vec::with_capacity(spec.exposed_ports().len());
    for &container_port in spec.exposed_ports() {
        let host_port = container
            .get_host_port_ipv4(container_port)
            .await
            .map_err(|e| RuntimeError::Connection(e.to_string()))?;
        ports.push(PortMapping {
            container_port,
            host_port,
        });
    }

    Ok((container, host, ports))
}

/// Client connection string for a started service
pub(crate) fn connection_string(spec: &ServiceSpec, host: &str, port: u16) -> String {
    match spec.kind() {
        ServiceKind::RelationalDb => {
            let (user, password) = spec.credentials().map_or(
                (DEFAULT_POSTGRES_USER, DEFAULT_POSTGRES_PASSWORD),
                |c| (c.username.as_str(), c.password.as_str()),
            );
            format!(
                "postgres://{user}:{password}@{host}:{port}/{}",
                spec.database().unwrap_or(DEFAULT_POSTGRES_DATABASE)
            )
        },
        ServiceKind::KvCache => format!("redis://{host}:{port}"),
        ServiceKind::DocumentStore => format!("mongodb://{host}:{port}"),
        ServiceKind::Broker => format!("{host}:{port}"),
    }
}

#[async_trait]
impl ContainerRuntimePort for TestcontainersRuntime {
    async fn start(&self, spec: &ServiceSpec) -> Result<StartedContainer, RuntimeError> {
        info!(
            service = %spec.name(),
            image = %spec.image(),
            "Starting container"
        );

        let (id, host, ports) = match spec.kind() {
            ServiceKind::RelationalDb => {
                let (container, host, ports) = launch(self.postgres_request(spec), spec).await?;
                let id = container.id().to_string();
                self.remember(&id, ManagedContainer::Postgres(container));
                (id, host, ports)
            },
            ServiceKind::KvCache => {
                let request = self.configure(Redis::default(), spec);
                let (container, host, ports) = launch(request, spec).await?;
                let id = container.id().to_string();
                self.remember(&id, ManagedContainer::Redis(container));
                (id, host, ports)
            },
            ServiceKind::DocumentStore => {
                let request = self.configure(Mongo::default(), spec);
                let (container, host, ports) = launch(request, spec).await?;
                let id = container.id().to_string();
                self.remember(&id, ManagedContainer::Mongo(container));
                (id, host, ports)
            },
            ServiceKind::Broker => {
                let request = self.configure(Kafka::default(), spec);
                let (container, host, ports) = launch(request, spec).await?;
                let id = container.id().to_string();
                self.remember(&id, ManagedContainer::Kafka(container));
                (id, host, ports)
            },
        };

        let primary_port = ports
            .iter()
            .find(|m| m.container_port == spec.primary_port())
            .map_or(0, |m| m.host_port);
        let connection_string = connection_string(spec, &host, primary_port);

        debug!(
            service = %spec.name(),
            container_id = %id,
            host = %host,
            ports = ?ports,
            "Container started"
        );

        let address = match InstanceAddress::new(host, ports, connection_string) {
            Ok(address) => address,
            Err(e) => {
                if let Err(stop_err) = self.stop(&id).await {
                    warn!(container_id = %id, error = %stop_err, "Failed to remove container");
                }
                return Err(RuntimeError::Connection(e.to_string()));
            },
        };

        Ok(StartedContainer {
            container_id: id,
            address,
        })
    }

    async fn stop(&self, container_id: &str) -> Result<(), RuntimeError> {
        let container = self.containers.lock().remove(container_id);
        match container {
            Some(container) => {
                container.remove().await?;
                debug!(container_id = %container_id, "Container removed");
                Ok(())
            },
            None => {
                debug!(container_id = %container_id, "Container already removed");
                Ok(())
            },
        }
    }
}
