//! Application state for the HTTP server.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::CredentialVerifier;
use crate::db::repository::ResponseRepository;
use crate::services::DEFAULT_FETCH_DEADLINE;

/// Shared application state passed to all handlers.
///
/// Everything here is immutable; each request builds its own report.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn ResponseRepository>,
    /// Session credential gate
    pub verifier: Arc<dyn CredentialVerifier>,
    /// Upper bound on one survey fetch
    pub fetch_deadline: Duration,
}

impl AppState {
    /// Create a new application state with the default fetch deadline.
    pub fn new(
        repository: Arc<dyn ResponseRepository>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            repository,
            verifier,
            fetch_deadline: DEFAULT_FETCH_DEADLINE,
        }
    }

    /// Override the fetch deadline.
    pub fn with_fetch_deadline(mut self, deadline: Duration) -> Self {
        self.fetch_deadline = deadline;
        self
    }
}
