//! Service spec entity
//!
//! Declares one backing service the harness should provision. Specs are
//! built once at configuration time and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::DomainError;
use crate::value_objects::{ImageRef, ServiceKind};

/// Username/password pair passed to the service at startup
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login name
    pub username: String,
    /// Login password
    pub password: String,
}

impl Credentials {
    /// Create credentials
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Declaration of one ephemeral backing service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    name: String,
    kind: ServiceKind,
    image: ImageRef,
    credentials: Option<Credentials>,
    database: Option<String>,
    init_script: Option<String>,
    exposed_ports: Vec<u16>,
    env: Vec<(String, String)>,
}

impl ServiceSpec {
    /// Create a spec exposing the kind's default port
    pub fn new(name: impl Into<String>, kind: ServiceKind, image: ImageRef) -> Self {
        Self {
            name: name.into(),
            kind,
            image,
            credentials: None,
            database: None,
            init_script: None,
            exposed_ports: vec![kind.default_port()],
            env: Vec::new(),
        }
    }

    /// PostgreSQL with database `testdb`, user and password `test`
    #[must_use]
    pub fn postgres() -> Self {
        Self::new("postgres", ServiceKind::RelationalDb, builtin_image("postgres", "15-alpine"))
            .with_database("testdb")
            .with_credentials(Credentials::new("test", "test"))
    }

    /// Redis cache
    #[must_use]
    pub fn redis() -> Self {
        Self::new("redis", ServiceKind::KvCache, builtin_image("redis", "7-alpine"))
    }

    /// MongoDB document store
    #[must_use]
    pub fn mongo() -> Self {
        Self::new("mongo", ServiceKind::DocumentStore, builtin_image("mongo", "6"))
    }

    /// Kafka broker
    #[must_use]
    pub fn kafka() -> Self {
        Self::new(
            "kafka",
            ServiceKind::Broker,
            builtin_image("confluentinc/cp-kafka", "7.5.0"),
        )
    }

    /// Set credentials
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the database to create
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set a script the service runs once at startup
    #[must_use]
    pub fn with_init_script(mut self, script: impl Into<String>) -> Self {
        self.init_script = Some(script.into());
        self
    }

    /// Replace the image
    #[must_use]
    pub fn with_image(mut self, image: ImageRef) -> Self {
        self.image = image;
        self
    }

    /// Expose an additional container port
    #[must_use]
    pub fn with_exposed_port(mut self, port: u16) -> Self {
        if !self.exposed_ports.contains(&port) {
            self.exposed_ports.push(port);
        }
        self
    }

    /// Add an environment variable
    #[must_use]
    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Check the spec is usable
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidSpec` for a blank name or no exposed port.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidSpec("service name is empty".to_string()));
        }
        if self.exposed_ports.is_empty() {
            return Err(DomainError::InvalidSpec(format!(
                "service {} exposes no ports",
                self.name
            )));
        }
        Ok(())
    }

    /// Unique service name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Service kind
    #[must_use]
    pub const fn kind(&self) -> ServiceKind {
        self.kind
    }

    /// Container image
    #[must_use]
    pub const fn image(&self) -> &ImageRef {
        &self.image
    }

    /// Credentials, if any
    #[must_use]
    pub const fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Database name, if any
    #[must_use]
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Init script, if any
    #[must_use]
    pub fn init_script(&self) -> Option<&str> {
        self.init_script.as_deref()
    }

    /// Exposed container ports; the first one is the primary port
    #[must_use]
    pub fn exposed_ports(&self) -> &[u16] {
        &self.exposed_ports
    }

    /// Primary container port
    #[must_use]
    pub fn primary_port(&self) -> u16 {
        self.exposed_ports
            .first()
            .copied()
            .unwrap_or_else(|| self.kind.default_port())
    }

    /// Extra environment variables
    #[must_use]
    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }
}

fn builtin_image(name: &'static str, tag: &'static str) -> ImageRef {
    ImageRef::builtin(name, tag)
}
