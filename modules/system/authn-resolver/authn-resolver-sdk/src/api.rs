//! Public API trait for the `AuthN` resolver.
//!
//! The access gate calls this trait whenever the access policy decides a
//! request must be authenticated. Credential storage lives behind it.

use async_trait::async_trait;

use crate::error::AuthNResolverError;
use crate::models::{AuthenticationResult, BasicCredentials};

/// Credential verification used by the access gate.
///
/// ```ignore
/// let authn: Arc<dyn AuthNResolverClient> = Arc::new(static_authn_plugin::Service::from_config(&cfg));
///
/// let result = authn.authenticate(&BasicCredentials::new("ops", "s3cret")).await?;
/// let ctx = result.security_context;
/// ```
#[async_trait]
pub trait AuthNResolverClient: Send + Sync {
    /// Verify a username/password pair and return the validated identity.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` if the principal is unknown or the password does not match
    /// - `ServiceUnavailable` if the credential store is not reachable
    /// - `Internal` for unexpected errors
    async fn authenticate(
        &self,
        credentials: &BasicCredentials,
    ) -> Result<AuthenticationResult, AuthNResolverError>;
}
