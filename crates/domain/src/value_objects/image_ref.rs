//! Container image reference value object

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::DomainError;

const DEFAULT_TAG: &str = "latest";

/// Reference to a container image as `name:tag`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    name: String,
    tag: String,
}

impl ImageRef {
    /// Image reference from non-blank literals, skipping validation
    pub(crate) fn builtin(name: &'static str, tag: &'static str) -> Self {
        debug_assert!(!name.trim().is_empty() && !tag.trim().is_empty());
        Self {
            name: name.to_string(),
            tag: tag.to_string(),
        }
    }

    /// Create an image reference from its parts
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidImageReference` if either part is blank.
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let tag = tag.into();
        if name.trim().is_empty() {
            return Err(DomainError::InvalidImageReference(
                "image name is empty".to_string(),
            ));
        }
        if tag.trim().is_empty() {
            return Err(DomainError::InvalidImageReference(format!(
                "image {name} has an empty tag"
            )));
        }
        Ok(Self { name, tag })
    }

    /// Parse `registry:port/name:tag`, `name:tag` or `name`.
    ///
    /// The tag is whatever follows the last `:` after the last `/`,
    /// so a registry port is never mistaken for a tag.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidImageReference` on an empty name or tag.
    pub fn parse(reference: &str) -> Result<Self, DomainError> {
        let reference = reference.trim();
        let path_start = reference.rfind('/').map_or(0, |idx| idx + 1);

        match reference[path_start..].rfind(':') {
            Some(offset) => {
                let split = path_start + offset;
                Self::new(&reference[..split], &reference[split + 1..])
            },
            None => Self::new(reference, DEFAULT_TAG),
        }
    }

    /// Image name without tag
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Image tag
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.tag)
    }
}

impl std::str::FromStr for ImageRef {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
