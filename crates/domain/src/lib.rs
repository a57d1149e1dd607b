//! Domain layer for the ephemeral environment harness
//!
//! Describes backing services (specs), the instances started for them, and
//! the rules an instance address must satisfy. No container or client code
//! lives here.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
