//! Per-service image and credential settings.

use domain::{Credentials, DomainError, ImageRef, ServiceSpec};
use serde::{Deserialize, Serialize};

use super::default_true;

const DEFAULT_INIT_SQL: &str = include_str!("../../sql/init.sql");

/// Image override and toggle for a service without credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceImageConfig {
    /// Whether the service is provisioned (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Image name override
    #[serde(default)]
    pub image: Option<String>,

    /// Image tag override
    #[serde(default)]
    pub tag: Option<String>,
}

impl Default for ServiceImageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            image: None,
            tag: None,
        }
    }
}

impl ServiceImageConfig {
    /// Apply the overrides to a built-in spec, `None` when disabled
    pub fn apply(&self, base: ServiceSpec) -> Result<Option<ServiceSpec>, DomainError> {
        if !self.enabled {
            return Ok(None);
        }
        let image = override_image(base.image(), self.image.as_deref(), self.tag.as_deref())?;
        Ok(Some(base.with_image(image)))
    }
}

/// PostgreSQL settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresServiceConfig {
    /// Whether the service is provisioned (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Image name override
    #[serde(default)]
    pub image: Option<String>,

    /// Image tag override
    #[serde(default)]
    pub tag: Option<String>,

    /// Database name (default: testdb)
    #[serde(default = "default_database")]
    pub database: String,

    /// Username (default: test)
    #[serde(default = "default_username")]
    pub username: String,

    /// Password (default: test)
    #[serde(default = "default_password")]
    pub password: String,

    /// SQL run on first start; the bundled seed schema when unset
    #[serde(default)]
    pub init_script: Option<String>,
}

fn default_database() -> String {
    "testdb".to_string()
}

fn default_username() -> String {
    "test".to_string()
}

fn default_password() -> String {
    "test".to_string()
}

impl Default for PostgresServiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            image: None,
            tag: None,
            database: default_database(),
            username: default_username(),
            password: default_password(),
            init_script: None,
        }
    }
}

impl PostgresServiceConfig {
    /// Build the PostgreSQL spec, `None` when disabled
    pub fn to_spec(&self) -> Result<Option<ServiceSpec>, DomainError> {
        if !self.enabled {
            return Ok(None);
        }
        let base = ServiceSpec::postgres();
        let image = override_image(base.image(), self.image.as_deref(), self.tag.as_deref())?;
        let script = self.init_script.as_deref().unwrap_or(DEFAULT_INIT_SQL);
        Ok(Some(
            base.with_image(image)
                .with_database(self.database.as_str())
                .with_credentials(Credentials::new(
                    self.username.as_str(),
                    self.password.as_str(),
                ))
                .with_init_script(script),
        ))
    }
}

fn override_image(
    base: &ImageRef,
    name: Option<&str>,
    tag: Option<&str>,
) -> Result<ImageRef, DomainError> {
    match (name, tag) {
        (None, None) => Ok(base.clone()),
        _ => ImageRef::new(name.unwrap_or(base.name()), tag.unwrap_or(base.tag())),
    }
}
