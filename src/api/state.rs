//! Application state for the expense engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::ConfigLoader;
use crate::directory::EmployeeDirectory;
use crate::ledger::AdvanceLedger;
use crate::router::ClaimRouter;

/// Shared application state.
///
/// Contains the ledger, router, and employee directory shared across
/// all request handlers.
#[derive(Clone)]
pub struct AppState {
    ledger: Arc<AdvanceLedger>,
    router: Arc<ClaimRouter>,
    directory: Arc<dyn EmployeeDirectory>,
}

impl AppState {
    /// Creates the application state from a loaded configuration and an
    /// employee directory, wiring up fresh in-memory stores.
    pub fn new(config: ConfigLoader, directory: Arc<dyn EmployeeDirectory>) -> Self {
        let config = Arc::new(config);
        let ledger = Arc::new(AdvanceLedger::in_memory());
        let router = Arc::new(ClaimRouter::in_memory(Arc::clone(&ledger), config));
        Self {
            ledger,
            router,
            directory,
        }
    }

    /// Returns the advance ledger.
    pub fn ledger(&self) -> &AdvanceLedger {
        &self.ledger
    }

    /// Returns the claim router.
    pub fn router(&self) -> &ClaimRouter {
        &self.router
    }

    /// Returns the employee directory.
    pub fn directory(&self) -> &dyn EmployeeDirectory {
        self.directory.as_ref()
    }
}
