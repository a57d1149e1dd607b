//! Value objects - Immutable types defined by their attributes

mod address;
mod expiry;
mod image_ref;
mod readiness;
mod service_kind;

pub use address::{InstanceAddress, PortMapping, has_scheme, is_bootstrap_address};
pub use expiry::ttl_within;
pub use image_ref::ImageRef;
pub use readiness::Readiness;
pub use service_kind::ServiceKind;
