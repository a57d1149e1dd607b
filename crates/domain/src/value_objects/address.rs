//! Externally reachable address of a provisioned instance

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::DomainError;

/// Mapping from a container port to the port published on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortMapping {
    /// Port inside the container
    pub container_port: u16,
    /// Port published on the host
    pub host_port: u16,
}

/// Where clients reach a running instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceAddress {
    host: String,
    ports: Vec<PortMapping>,
    connection_string: String,
}

impl InstanceAddress {
    /// Create an address
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidAddress` if the host or connection string
    /// is blank or no port is mapped.
    pub fn new(
        host: impl Into<String>,
        ports: Vec<PortMapping>,
        connection_string: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let host = host.into();
        let connection_string = connection_string.into();

        if host.trim().is_empty() {
            return Err(DomainError::InvalidAddress("host is empty".to_string()));
        }
        if ports.is_empty() {
            return Err(DomainError::InvalidAddress(format!(
                "no ports mapped for {host}"
            )));
        }
        if connection_string.trim().is_empty() {
            return Err(DomainError::InvalidAddress(
                "connection string is empty".to_string(),
            ));
        }

        Ok(Self {
            host,
            ports,
            connection_string,
        })
    }

    /// Host the instance is reachable on
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// All port mappings
    #[must_use]
    pub fn ports(&self) -> &[PortMapping] {
        &self.ports
    }

    /// Host port published for `container_port`
    #[must_use]
    pub fn host_port(&self, container_port: u16) -> Option<u16> {
        self.ports
            .iter()
            .find(|m| m.container_port == container_port)
            .map(|m| m.host_port)
    }

    /// First published host port
    #[must_use]
    pub fn primary_port(&self) -> u16 {
        self.ports.first().map_or(0, |m| m.host_port)
    }

    /// Client connection string (URL, or bootstrap list for brokers)
    #[must_use]
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }
}

impl fmt::Display for InstanceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.connection_string)
    }
}

/// Whether `connection_string` is non-empty and starts with `scheme`
#[must_use]
pub fn has_scheme(connection_string: &str, scheme: &str) -> bool {
    !connection_string.is_empty() && connection_string.starts_with(scheme)
}

/// Whether `bootstrap` is a non-empty, comma-separated list of `host:port` entries
#[must_use]
pub fn is_bootstrap_address(bootstrap: &str) -> bool {
    !bootstrap.trim().is_empty()
        && bootstrap
            .split(',')
            .all(|entry| entry.trim().contains(':'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(container_port: u16, host_port: u16) -> PortMapping {
        PortMapping {
            container_port,
            host_port,
        }
    }

    #[test]
    fn host_port_lookup() {
        let address = InstanceAddress::new(
            "localhost",
            vec![mapping(6379, 49153)],
            "redis://localhost:49153",
        )
        .unwrap();

        assert_eq!(address.host_port(6379), Some(49153));
        assert_eq!(address.host_port(5432), None);
        assert_eq!(address.primary_port(), 49153);
    }

    #[test]
    fn rejects_blank_host() {
        let err = InstanceAddress::new(" ", vec![mapping(1, 2)], "x://y").unwrap_err();
        assert!(matches!(err, DomainError::InvalidAddress(_)));
    }

    #[test]
    fn rejects_missing_ports() {
        assert!(InstanceAddress::new("localhost", vec![], "redis://localhost").is_err());
    }

    #[test]
    fn rejects_blank_connection_string() {
        assert!(InstanceAddress::new("localhost", vec![mapping(1, 2)], "").is_err());
    }

    #[test]
    fn display_is_connection_string() {
        let address =
            InstanceAddress::new("127.0.0.1", vec![mapping(9093, 40000)], "127.0.0.1:40000")
                .unwrap();
        assert_eq!(address.to_string(), "127.0.0.1:40000");
    }

    #[test]
    fn scheme_check() {
        assert!(has_scheme("mongodb://localhost:27017", "mongodb://"));
        assert!(!has_scheme("postgres://localhost", "mongodb://"));
        assert!(!has_scheme("", ""));
    }

    #[test]
    fn bootstrap_check() {
        assert!(is_bootstrap_address("localhost:9093"));
        assert!(is_bootstrap_address("a:1, b:2"));
        assert!(!is_bootstrap_address("localhost"));
        assert!(!is_bootstrap_address("a:1,b"));
        assert!(!is_bootstrap_address(""));
    }
}
