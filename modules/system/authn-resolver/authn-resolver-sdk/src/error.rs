//! Error types for the `AuthN` resolver.

use thiserror::Error;

/// Errors that can occur when verifying credentials.
#[derive(Debug, Error)]
pub enum AuthNResolverError {
    /// Unknown principal or wrong secret.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The credential store cannot be reached right now.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}
