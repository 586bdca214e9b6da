use std::sync::Arc;

use crate::models::catalog::Catalog;
use crate::services::estimator::Estimator;

/// Read-only state handed to every handler. Nothing here is mutated after
/// startup, so no locks are needed.
#[derive(Clone, Debug)]
pub struct AppState {
    pub estimator: Arc<Estimator>,
}

impl AppState {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            estimator: Arc::new(Estimator::new(Arc::new(catalog))),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        self.estimator.catalog()
    }
}
