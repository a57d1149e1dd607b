//! Domain entities

mod running_instance;
mod service_spec;

pub use running_instance::RunningInstance;
pub use service_spec::{Credentials, ServiceSpec};
