use std::sync::Arc;

use crate::domain::AppPaths;
use crate::ports::{ClientFactory, ConfigStore};

/// Application context holding dependencies for command execution.
///
/// Cloned into the scheduler and server threads, so dependencies are shared
/// behind `Arc`.
#[derive(Clone)]
pub struct AppContext {
    store: Arc<dyn ConfigStore>,
    clients: Arc<dyn ClientFactory>,
}

impl AppContext {
    pub fn new(store: Arc<dyn ConfigStore>, clients: Arc<dyn ClientFactory>) -> Self {
        Self { store, clients }
    }

    /// Settings persistence.
    pub fn store(&self) -> &dyn ConfigStore {
        self.store.as_ref()
    }

    /// Source client construction.
    pub fn clients(&self) -> &dyn ClientFactory {
        self.clients.as_ref()
    }

    pub fn paths(&self) -> &AppPaths {
        self.store.paths()
    }
}
