//! Repository trait definitions for database operations.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`responses`]: Read access to joined survey responses
//!
//! Services take the trait object (`&dyn ResponseRepository`) so the HTTP
//! layer can swap the Postgres backend for the in-memory one in tests.

pub mod error;
pub mod responses;

// Re-export error types
pub use error::{ErrorContext, RepositoryError, RepositoryResult};

// Re-export traits
pub use responses::ResponseRepository;
