//! Smoke checks, one per service kind

mod broker;
mod cache;
mod document_store;
mod relational;

use std::sync::Arc;

use application::SmokeCheck;

pub use broker::BrokerCheck;
pub use cache::CacheCheck;
pub use document_store::DocumentStoreCheck;
pub use relational::RelationalCheck;

/// One check for every supported service kind
#[must_use]
pub fn all() -> Vec<Arc<dyn SmokeCheck>> {
    vec![
        Arc::new(RelationalCheck),
        Arc::new(CacheCheck),
        Arc::new(DocumentStoreCheck),
        Arc::new(BrokerCheck),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::ServiceKind;

    #[test]
    fn covers_every_kind_once() {
        let checks = all();
        for kind in ServiceKind::ALL {
            assert_eq!(checks.iter().filter(|c| c.kind() == kind).count(), 1);
        }
    }
}
