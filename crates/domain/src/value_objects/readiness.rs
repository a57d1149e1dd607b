//! Readiness state of a running instance

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a provisioned instance
///
/// `Starting -> Ready -> Released`, or `Starting -> Released` when teardown
/// happens before the instance ever became ready. `Released` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    /// Container started, not yet accepting connections
    #[default]
    Starting,
    /// Readiness probe succeeded; address is usable
    Ready,
    /// Container released by teardown
    Released,
}

impl Readiness {
    /// Whether a transition from `self` to `next` is allowed
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Starting, Self::Ready | Self::Released) | (Self::Ready, Self::Released)
        )
    }

    /// Whether the instance still holds container resources
    #[must_use]
    pub const fn is_live(&self) -> bool {
        !matches!(self, Self::Released)
    }

    /// Get a human-readable label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Released => "released",
        }
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
