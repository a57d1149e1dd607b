//! Environment provisioning service
//!
//! Starts one container per service spec, waits for each to pass its
//! readiness probe within a bounded time, and releases everything it
//! started on teardown or on a failed start.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use domain::{InstanceAddress, RunningInstance, ServiceKind, ServiceSpec};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::time::{self, sleep, timeout_at};
use tracing::{debug, info, instrument, warn};

use crate::error::ProvisionError;
use crate::ports::{ContainerRuntimePort, ReadinessProbePort};
use crate::services::ReadinessPolicy;

/// Default bound on how long a service may take to become ready
const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 60;

/// Provisioner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionerConfig {
    /// Bound on container start plus readiness per service in seconds (default: 60)
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_secs: u64,

    /// Delay schedule between readiness probes
    #[serde(default)]
    pub readiness: ReadinessPolicy,
}

const fn default_startup_timeout() -> u64 {
    DEFAULT_STARTUP_TIMEOUT_SECS
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            startup_timeout_secs: default_startup_timeout(),
            readiness: ReadinessPolicy::default(),
        }
    }
}

impl ProvisionerConfig {
    /// Startup timeout as a duration
    #[must_use]
    pub const fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }
}

/// The set of instances started by one `Provisioner::start` call
#[derive(Debug, Default)]
pub struct Environment {
    instances: BTreeMap<String, RunningInstance>,
}

impl Environment {
    /// Build an environment from already started instances
    pub fn from_instances(instances: impl IntoIterator<Item = RunningInstance>) -> Self {
        Self {
            instances: instances
                .into_iter()
                .map(|instance| (instance.name().to_string(), instance))
                .collect(),
        }
    }

    /// Instance by service name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RunningInstance> {
        self.instances.get(name)
    }

    /// Instances of one kind, ordered by name
    pub fn of_kind(&self, kind: ServiceKind) -> impl Iterator<Item = &RunningInstance> {
        self.instances.values().filter(move |i| i.kind() == kind)
    }

    /// All instances, ordered by name
    pub fn iter(&self) -> impl Iterator<Item = &RunningInstance> {
        self.instances.values()
    }

    /// Number of instances
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether the environment holds no instances
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Whether any instance still holds container resources
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.instances.values().any(|i| i.readiness().is_live())
    }
}

/// Outcome of a teardown pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeardownSummary {
    /// Containers stopped without error
    pub released: usize,
    /// Containers whose stop call failed (logged, not propagated)
    pub failed: usize,
    /// Instances already released by an earlier pass
    pub skipped: usize,
}

impl TeardownSummary {
    /// Whether every release attempt succeeded
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Service that owns container lifecycle for a set of specs
pub struct Provisioner {
    runtime: Arc<dyn ContainerRuntimePort>,
    probe: Arc<dyn ReadinessProbePort>,
    config: ProvisionerConfig,
}

impl std::fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provisioner")
            .field("runtime", &"<ContainerRuntimePort>")
            .field("probe", &"<ReadinessProbePort>")
            .field("config", &self.config)
            .finish()
    }
}

impl Provisioner {
    /// Create a provisioner with default settings
    #[must_use]
    pub fn new(runtime: Arc<dyn ContainerRuntimePort>, probe: Arc<dyn ReadinessProbePort>) -> Self {
        Self {
            runtime,
            probe,
            config: ProvisionerConfig::default(),
        }
    }

    /// Set the provisioner configuration
    #[must_use]
    pub fn with_config(mut self, config: ProvisionerConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration
    #[must_use]
    pub const fn config(&self) -> &ProvisionerConfig {
        &self.config
    }

    /// Start every spec concurrently and wait until all are ready.
    ///
    /// If any service fails to start or to become ready, every container
    /// that did start is released before the error is returned.
    #[instrument(skip_all, fields(services = specs.len()))]
    pub async fn start(&self, specs: Vec<ServiceSpec>) -> Result<Environment, ProvisionError> {
        let mut names = HashSet::new();
        for spec in &specs {
            spec.validate()?;
            if !names.insert(spec.name().to_string()) {
                return Err(ProvisionError::DuplicateService(spec.name().to_string()));
            }
        }

        let started = Instant::now();
        let results = join_all(specs.into_iter().map(|spec| self.start_one(spec))).await;

        let mut instances = Vec::new();
        let mut first_error = None;
        for result in results {
            match result {
                Ok(instance) => instances.push(instance),
                Err(err) if first_error.is_none() => first_error = Some(err),
                Err(err) => warn!(error = %err, "Additional provisioning failure"),
            }
        }

        let mut environment = Environment::from_instances(instances);
        if let Some(err) = first_error {
            warn!(
                error = %err,
                started = environment.len(),
                "Provisioning failed, releasing started services"
            );
            self.stop(&mut environment).await;
            return Err(err);
        }

        info!(
            services = environment.len(),
            elapsed_ms = elapsed_ms(started),
            "Environment ready"
        );
        Ok(environment)
    }

    /// Release every live instance exactly once.
    ///
    /// Failures are logged and counted, never returned. Calling this again
    /// on the same environment releases nothing and reports only skips.
    #[instrument(skip_all, fields(services = environment.len()))]
    pub async fn stop(&self, environment: &mut Environment) -> TeardownSummary {
        let mut summary = TeardownSummary::default();
        let mut pending = Vec::new();

        for instance in environment.instances.values_mut() {
            if instance.readiness().is_live() {
                pending.push(self.release(instance));
            } else {
                summary.skipped += 1;
            }
        }

        for released in join_all(pending).await {
            if released {
                summary.released += 1;
            } else {
                summary.failed += 1;
            }
        }

        if summary.released + summary.failed > 0 {
            info!(
                released = summary.released,
                failed = summary.failed,
                skipped = summary.skipped,
                "Environment torn down"
            );
        } else {
            debug!(skipped = summary.skipped, "Nothing left to tear down");
        }
        summary
    }

    #[instrument(
        skip_all,
        fields(service = %spec.name(), kind = %spec.kind(), image = %spec.image())
    )]
    async fn start_one(&self, spec: ServiceSpec) -> Result<RunningInstance, ProvisionError> {
        let service = spec.name().to_string();
        let timeout_secs = self.config.startup_timeout_secs;
        let deadline = time::Instant::now() + self.config.startup_timeout();
        info!("Starting service");

        // Container start and readiness polling share one deadline.
        let started = match timeout_at(deadline, self.runtime.start(&spec)).await {
            Ok(result) => result.map_err(|e| ProvisionError::Start {
                service: service.clone(),
                reason: e.to_string(),
            })?,
            Err(_) => {
                warn!(timeout_secs, "Container did not start in time");
                return Err(ProvisionError::ReadinessTimeout {
                    service,
                    timeout_secs,
                });
            },
        };

        let mut instance = RunningInstance::starting(spec, started.container_id);
        debug!(container_id = %instance.container_id(), "Container started");

        if let Err(err) = self
            .wait_until_ready(&instance, &started.address, deadline)
            .await
        {
            self.release(&mut instance).await;
            return Err(err);
        }

        if let Err(err) = instance.mark_ready(started.address) {
            self.release(&mut instance).await;
            return Err(err.into());
        }
        Ok(instance)
    }

    async fn wait_until_ready(
        &self,
        instance: &RunningInstance,
        address: &InstanceAddress,
        deadline: time::Instant,
    ) -> Result<(), ProvisionError> {
        let kind = instance.kind();
        let started = Instant::now();

        let polling = async {
            let mut attempt = 0u32;
            loop {
                match self.probe.probe(kind, address).await {
                    Ok(()) => return attempt + 1,
                    Err(e) => {
                        let delay = self.config.readiness.delay_for_attempt(attempt);
                        debug!(
                            attempt = attempt + 1,
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            error = %e,
                            "Service not ready yet"
                        );
                        sleep(delay).await;
                        attempt = attempt.saturating_add(1);
                    },
                }
            }
        };

        match timeout_at(deadline, polling).await {
            Ok(attempts) => {
                info!(
                    host = %address.host(),
                    port = address.primary_port(),
                    attempts,
                    elapsed_ms = elapsed_ms(started),
                    "Service ready"
                );
                Ok(())
            },
            Err(_) => {
                warn!(
                    timeout_secs = self.config.startup_timeout_secs,
                    "Service did not become ready in time"
                );
                Err(ProvisionError::ReadinessTimeout {
                    service: instance.name().to_string(),
                    timeout_secs: self.config.startup_timeout_secs,
                })
            },
        }
    }

    /// Stop one container and mark it released whatever the outcome.
    async fn release(&self, instance: &mut RunningInstance) -> bool {
        let result = self.runtime.stop(instance.container_id()).await;

        if let Err(e) = instance.mark_released() {
            warn!(service = %instance.name(), error = %e, "Release on non-live instance");
        }

        match result {
            Ok(()) => {
                debug!(
                    service = %instance.name(),
                    container_id = %instance.container_id(),
                    "Container released"
                );
                true
            },
            Err(e) => {
                warn!(
                    service = %instance.name(),
                    container_id = %instance.container_id(),
                    error = %e,
                    "Failed to release container"
                );
                false
            },
        }
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use crate::ports::{MockContainerRuntimePort, MockReadinessProbePort, StartedContainer};
    use domain::{PortMapping, Readiness};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn address_for(spec: &ServiceSpec) -> InstanceAddress {
        let port = spec.primary_port();
        InstanceAddress::new(
            "localhost",
            vec![PortMapping {
                container_port: port,
                host_port: port + 10_000,
            }],
            format!("{}localhost:{}", spec.kind().scheme().unwrap_or(""), port + 10_000),
        )
        .unwrap()
    }

    fn runtime_starting_everything() -> MockContainerRuntimePort {
        let mut runtime = MockContainerRuntimePort::new();
        runtime.expect_start().returning(|spec| {
            Ok(StartedContainer {
                container_id: format!("{}-id", spec.name()),
                address: address_for(spec),
            })
        });
        runtime
    }

    fn always_ready() -> MockReadinessProbePort {
        let mut probe = MockReadinessProbePort::new();
        probe.expect_probe().returning(|_, _| Ok(()));
        probe
    }

    fn fast_config(timeout_secs: u64) -> ProvisionerConfig {
        ProvisionerConfig {
            startup_timeout_secs: timeout_secs,
            readiness: ReadinessPolicy::new(10, 20).without_jitter(),
        }
    }

    fn all_specs() -> Vec<ServiceSpec> {
        vec![
            ServiceSpec::postgres(),
            ServiceSpec::redis(),
            ServiceSpec::mongo(),
            ServiceSpec::kafka(),
        ]
    }

    #[test]
    fn config_default() {
        let config = ProvisionerConfig::default();
        assert_eq!(config.startup_timeout_secs, 60);
        assert_eq!(config.startup_timeout(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn start_provisions_all_services() {
        let provisioner = Provisioner::new(
            Arc::new(runtime_starting_everything()),
            Arc::new(always_ready()),
        );

        let environment = provisioner.start(all_specs()).await.unwrap();

        assert_eq!(environment.len(), 4);
        for instance in environment.iter() {
            assert!(instance.is_ready());
            assert!(!instance.address().unwrap().connection_string().is_empty());
        }
        let mongo = environment.get("mongo").unwrap();
        assert!(
            mongo
                .address()
                .unwrap()
                .connection_string()
                .starts_with("mongodb://")
        );
        assert_eq!(environment.of_kind(ServiceKind::Broker).count(), 1);
    }

    #[tokio::test]
    async fn polls_until_probe_succeeds() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);
        let mut probe = MockReadinessProbePort::new();
        probe.expect_probe().returning(move |_, _| {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(RuntimeError::HealthCheck("connection refused".to_string()))
            } else {
                Ok(())
            }
        });

        let provisioner = Provisioner::new(Arc::new(runtime_starting_everything()), Arc::new(probe))
            .with_config(fast_config(5));

        let environment = provisioner
            .start(vec![ServiceSpec::redis()])
            .await
            .unwrap();

        assert!(environment.get("redis").unwrap().is_ready());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn readiness_timeout_is_fatal_and_releases_container() {
        let mut runtime = runtime_starting_everything();
        runtime
            .expect_stop()
            .withf(|id| id.starts_with("kafka"))
            .times(1)
            .returning(|_| Ok(()));

        let mut probe = MockReadinessProbePort::new();
        probe
            .expect_probe()
            .returning(|_, _| Err(RuntimeError::HealthCheck("not yet".to_string())));

        let provisioner =
            Provisioner::new(Arc::new(runtime), Arc::new(probe)).with_config(fast_config(1));

        let err = provisioner
            .start(vec![ServiceSpec::kafka()])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProvisionError::ReadinessTimeout { ref service, timeout_secs: 1 } if service == "kafka"
        ));
    }

    /// Runtime whose `start` takes `delay` before handing out a container
    struct SlowRuntime {
        delay: Duration,
        stops: AtomicU32,
    }

    impl SlowRuntime {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                stops: AtomicU32::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl ContainerRuntimePort for SlowRuntime {
        async fn start(&self, spec: &ServiceSpec) -> Result<StartedContainer, RuntimeError> {
            sleep(self.delay).await;
            Ok(StartedContainer {
                container_id: format!("{}-id", spec.name()),
                address: address_for(spec),
            })
        }

        async fn stop(&self, _container_id: &str) -> Result<(), RuntimeError> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn never_ready() -> MockReadinessProbePort {
        let mut probe = MockReadinessProbePort::new();
        probe
            .expect_probe()
            .returning(|_, _| Err(RuntimeError::HealthCheck("not yet".to_string())));
        probe
    }

    #[tokio::test]
    async fn slow_container_start_counts_against_startup_timeout() {
        let runtime = Arc::new(SlowRuntime::new(Duration::from_millis(1_500)));
        let provisioner = Provisioner::new(
            Arc::clone(&runtime) as Arc<dyn ContainerRuntimePort>,
            Arc::new(never_ready()),
        )
        .with_config(fast_config(1));

        let begun = Instant::now();
        let err = provisioner
            .start(vec![ServiceSpec::kafka()])
            .await
            .unwrap_err();

        assert!(begun.elapsed() < Duration::from_millis(1_300));
        assert!(matches!(
            err,
            ProvisionError::ReadinessTimeout { timeout_secs: 1, .. }
        ));
        assert_eq!(runtime.stops.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn readiness_polling_gets_only_the_time_left_after_start() {
        let runtime = Arc::new(SlowRuntime::new(Duration::from_millis(700)));
        let provisioner = Provisioner::new(
            Arc::clone(&runtime) as Arc<dyn ContainerRuntimePort>,
            Arc::new(never_ready()),
        )
        .with_config(fast_config(1));

        let begun = Instant::now();
        let err = provisioner
            .start(vec![ServiceSpec::redis()])
            .await
            .unwrap_err();

        assert!(begun.elapsed() < Duration::from_millis(1_300));
        assert!(matches!(err, ProvisionError::ReadinessTimeout { .. }));
        assert_eq!(runtime.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn start_failure_rolls_back_started_services() {
        let mut runtime = MockContainerRuntimePort::new();
        runtime.expect_start().returning(|spec| {
            if spec.kind() == ServiceKind::Broker {
                Err(RuntimeError::Start("image not found".to_string()))
            } else {
                Ok(StartedContainer {
                    container_id: format!("{}-id", spec.name()),
                    address: address_for(spec),
                })
            }
        });
        runtime.expect_stop().times(3).returning(|_| Ok(()));

        let provisioner = Provisioner::new(Arc::new(runtime), Arc::new(always_ready()));

        let err = provisioner.start(all_specs()).await.unwrap_err();

        match err {
            ProvisionError::Start { service, reason } => {
                assert_eq!(service, "kafka");
                assert!(reason.contains("image not found"));
            },
            other => unreachable!("Expected Start error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_names_rejected_before_starting() {
        let mut runtime = MockContainerRuntimePort::new();
        runtime.expect_start().never();

        let provisioner = Provisioner::new(Arc::new(runtime), Arc::new(always_ready()));
        let err = provisioner
            .start(vec![ServiceSpec::redis(), ServiceSpec::redis()])
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::DuplicateService(ref name) if name == "redis"));
    }

    #[tokio::test]
    async fn invalid_spec_rejected_before_starting() {
        let mut runtime = MockContainerRuntimePort::new();
        runtime.expect_start().never();

        let spec = ServiceSpec::new("", ServiceKind::KvCache, ServiceSpec::redis().image().clone());
        let provisioner = Provisioner::new(Arc::new(runtime), Arc::new(always_ready()));

        let err = provisioner.start(vec![spec]).await.unwrap_err();
        assert!(matches!(err, ProvisionError::Domain(_)));
    }

    #[tokio::test]
    async fn teardown_is_idempotent() {
        let mut runtime = runtime_starting_everything();
        runtime.expect_stop().times(4).returning(|_| Ok(()));

        let provisioner = Provisioner::new(Arc::new(runtime), Arc::new(always_ready()));
        let mut environment = provisioner.start(all_specs()).await.unwrap();

        let first = provisioner.stop(&mut environment).await;
        assert_eq!(first.released, 4);
        assert!(first.is_clean());
        assert!(!environment.is_live());

        let second = provisioner.stop(&mut environment).await;
        assert_eq!(
            second,
            TeardownSummary {
                released: 0,
                failed: 0,
                skipped: 4
            }
        );
        for instance in environment.iter() {
            assert_eq!(instance.readiness(), Readiness::Released);
        }
    }

    #[tokio::test]
    async fn teardown_errors_are_counted_not_propagated() {
        let mut runtime = runtime_starting_everything();
        runtime.expect_stop().returning(|id| {
            if id.starts_with("redis") {
                Err(RuntimeError::Stop("daemon went away".to_string()))
            } else {
                Ok(())
            }
        });

        let provisioner = Provisioner::new(Arc::new(runtime), Arc::new(always_ready()));
        let mut environment = provisioner
            .start(vec![ServiceSpec::redis(), ServiceSpec::mongo()])
            .await
            .unwrap();

        let summary = provisioner.stop(&mut environment).await;
        assert_eq!(summary.released, 1);
        assert_eq!(summary.failed, 1);
        assert!(!summary.is_clean());
        assert!(!environment.is_live());
    }

    #[tokio::test]
    async fn empty_spec_set_yields_empty_environment() {
        let provisioner = Provisioner::new(
            Arc::new(MockContainerRuntimePort::new()),
            Arc::new(MockReadinessProbePort::new()),
        );
        let environment = provisioner.start(Vec::new()).await.unwrap();
        assert!(environment.is_empty());
    }
}
