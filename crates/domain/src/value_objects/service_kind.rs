//! Service kind value object
//!
//! Identifies which family of backing service a spec describes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::DomainError;

/// Kind of backing service a harness can provision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    /// Relational database (PostgreSQL)
    RelationalDb,
    /// Key-value cache (Redis)
    KvCache,
    /// Document store (MongoDB)
    DocumentStore,
    /// Message broker (Kafka)
    Broker,
}

impl ServiceKind {
    /// All kinds, in declaration order
    pub const ALL: [Self; 4] = [
        Self::RelationalDb,
        Self::KvCache,
        Self::DocumentStore,
        Self::Broker,
    ];

    /// Stable snake_case label used in logs and configuration
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::RelationalDb => "relational_db",
            Self::KvCache => "kv_cache",
            Self::DocumentStore => "document_store",
            Self::Broker => "broker",
        }
    }

    /// Port the service listens on inside its container
    #[must_use]
    pub const fn default_port(&self) -> u16 {
        match self {
            Self::RelationalDb => 5432,
            Self::KvCache => 6379,
            Self::DocumentStore => 27017,
            Self::Broker => 9093,
        }
    }

    /// Scheme prefix the connection string must carry, if any.
    ///
    /// Broker bootstrap lists are bare `host:port` pairs.
    #[must_use]
    pub const fn scheme(&self) -> Option<&'static str> {
        match self {
            Self::RelationalDb => Some("postgres://"),
            Self::KvCache => Some("redis://"),
            Self::DocumentStore => Some("mongodb://"),
            Self::Broker => None,
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ServiceKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "relational_db" | "postgres" | "postgresql" => Ok(Self::RelationalDb),
            "kv_cache" | "redis" | "cache" => Ok(Self::KvCache),
            "document_store" | "mongo" | "mongodb" => Ok(Self::DocumentStore),
            "broker" | "kafka" => Ok(Self::Broker),
            other => Err(DomainError::InvalidSpec(format!(
                "unknown service kind: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_snake_case() {
        assert_eq!(ServiceKind::RelationalDb.label(), "relational_db");
        assert_eq!(ServiceKind::KvCache.to_string(), "kv_cache");
    }

    #[test]
    fn parses_aliases() {
        assert_eq!(
            "postgres".parse::<ServiceKind>().unwrap(),
            ServiceKind::RelationalDb
        );
        assert_eq!("Redis".parse::<ServiceKind>().unwrap(), ServiceKind::KvCache);
        assert_eq!(
            "mongodb".parse::<ServiceKind>().unwrap(),
            ServiceKind::DocumentStore
        );
        assert_eq!(" kafka ".parse::<ServiceKind>().unwrap(), ServiceKind::Broker);
    }

    #[test]
    fn rejects_unknown_kind() {
        let err = "cassandra".parse::<ServiceKind>().unwrap_err();
        assert!(err.to_string().contains("cassandra"));
    }

    #[test]
    fn default_ports() {
        assert_eq!(ServiceKind::RelationalDb.default_port(), 5432);
        assert_eq!(ServiceKind::KvCache.default_port(), 6379);
        assert_eq!(ServiceKind::DocumentStore.default_port(), 27017);
        assert_eq!(ServiceKind::Broker.default_port(), 9093);
    }

    #[test]
    fn broker_has_no_scheme() {
        assert!(ServiceKind::Broker.scheme().is_none());
        assert_eq!(ServiceKind::DocumentStore.scheme(), Some("mongodb://"));
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&ServiceKind::DocumentStore).unwrap();
        assert_eq!(json, "\"document_store\"");
    }
}
