//! Smoke suite service
//!
//! Provisions an environment, runs every registered smoke check against the
//! instances of its kind, and tears the environment down whatever the
//! checks report.

use std::sync::Arc;
use std::time::{Duration, Instant};

use domain::{RunningInstance, ServiceSpec};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{error, info, instrument, warn};

use crate::error::{CheckError, ProvisionError};
use crate::ports::SmokeCheck;
use crate::services::{Environment, Provisioner, TeardownSummary};

/// Default per-check timeout in seconds
const DEFAULT_CHECK_TIMEOUT_SECS: u64 = 30;

/// Result of one check against one instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    /// Check name
    pub check: String,
    /// Service the check ran against, if one was found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Whether the check passed
    pub passed: bool,
    /// Error message if the check failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall time of the check in milliseconds
    pub duration_ms: u64,
}

impl CheckReport {
    fn from_result(
        check: &str,
        service: Option<&str>,
        result: Result<(), CheckError>,
        duration_ms: u64,
    ) -> Self {
        Self {
            check: check.to_string(),
            service: service.map(ToString::to_string),
            passed: result.is_ok(),
            error: result.err().map(|e| e.to_string()),
            duration_ms,
        }
    }
}

/// Outcome of a full smoke run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// One entry per executed check
    pub checks: Vec<CheckReport>,
    /// What teardown released
    pub teardown: TeardownSummary,
    /// When the run finished
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

impl SuiteReport {
    /// Create a report stamped with the current time
    #[must_use]
    pub fn new(checks: Vec<CheckReport>, teardown: TeardownSummary) -> Self {
        Self {
            checks,
            teardown,
            completed_at: chrono::Utc::now(),
        }
    }

    /// Whether every check passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// Checks that failed
    pub fn failures(&self) -> impl Iterator<Item = &CheckReport> {
        self.checks.iter().filter(|c| !c.passed)
    }

    /// Report for a check by name
    #[must_use]
    pub fn check(&self, name: &str) -> Option<&CheckReport> {
        self.checks.iter().find(|c| c.check == name)
    }
}

/// Provision, check, tear down
pub struct SmokeSuite {
    provisioner: Provisioner,
    checks: Vec<Arc<dyn SmokeCheck>>,
    check_timeout: Duration,
}

impl std::fmt::Debug for SmokeSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmokeSuite")
            .field("provisioner", &self.provisioner)
            .field(
                "checks",
                &self.checks.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field("check_timeout", &self.check_timeout)
            .finish()
    }
}

impl SmokeSuite {
    /// Create a suite with no checks registered
    #[must_use]
    pub fn new(provisioner: Provisioner) -> Self {
        Self {
            provisioner,
            checks: Vec::new(),
            check_timeout: Duration::from_secs(DEFAULT_CHECK_TIMEOUT_SECS),
        }
    }

    /// Register a check
    #[must_use]
    pub fn with_check(mut self, check: Arc<dyn SmokeCheck>) -> Self {
        self.checks.push(check);
        self
    }

    /// Set the per-check timeout
    #[must_use]
    pub const fn with_check_timeout(mut self, check_timeout: Duration) -> Self {
        self.check_timeout = check_timeout;
        self
    }

    /// Provisioner used by this suite
    #[must_use]
    pub const fn provisioner(&self) -> &Provisioner {
        &self.provisioner
    }

    /// Provision `specs`, run every check, then tear down.
    ///
    /// Only provisioning failures are returned as errors; check failures
    /// are recorded in the report.
    #[instrument(skip_all, fields(services = specs.len(), checks = self.checks.len()))]
    pub async fn run(&self, specs: Vec<ServiceSpec>) -> Result<SuiteReport, ProvisionError> {
        let mut environment = self.provisioner.start(specs).await?;
        log_addresses(&environment);

        let checks = self.run_checks(&environment).await;
        let teardown = self.provisioner.stop(&mut environment).await;

        let report = SuiteReport::new(checks, teardown);
        for failure in report.failures() {
            error!(
                check = %failure.check,
                error = failure.error.as_deref().unwrap_or("unknown"),
                "Smoke check failed"
            );
        }
        info!(
            passed = report.checks.iter().filter(|c| c.passed).count(),
            failed = report.failures().count(),
            "Smoke suite finished"
        );
        Ok(report)
    }

    /// Run every registered check against a provisioned environment.
    ///
    /// Checks run concurrently; a failing check never stops its siblings.
    pub async fn run_checks(&self, environment: &Environment) -> Vec<CheckReport> {
        let mut reports = Vec::new();
        let mut pending = Vec::new();

        for check in &self.checks {
            let mut matched = false;
            for instance in environment.of_kind(check.kind()) {
                matched = true;
                pending.push(self.run_check(check.as_ref(), instance));
            }
            if !matched {
                warn!(check = check.name(), kind = %check.kind(), "No instance for check");
                reports.push(CheckReport::from_result(
                    check.name(),
                    None,
                    Err(CheckError::MissingInstance(check.kind())),
                    0,
                ));
            }
        }

        reports.extend(join_all(pending).await);
        reports
    }

    #[instrument(skip_all, fields(check = check.name(), service = %instance.name()))]
    async fn run_check(&self, check: &dyn SmokeCheck, instance: &RunningInstance) -> CheckReport {
        let started = Instant::now();

        let result = match timeout(self.check_timeout, check.run(instance)).await {
            Ok(result) => result,
            Err(_) => Err(CheckError::TimedOut {
                check: check.name().to_string(),
                timeout_secs: self.check_timeout.as_secs(),
            }),
        };

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match &result {
            Ok(()) => info!(duration_ms, "Smoke check passed"),
            Err(e) => warn!(duration_ms, error = %e, "Smoke check failed"),
        }

        CheckReport::from_result(check.name(), Some(instance.name()), result, duration_ms)
    }
}

fn log_addresses(environment: &Environment) {
    for instance in environment.iter() {
        match instance.address() {
            Ok(address) => info!(
                service = %instance.name(),
                kind = %instance.kind(),
                address = %address,
                "Service available"
            ),
            Err(e) => warn!(service = %instance.name(), error = %e, "Service has no address"),
        }
    }
}
