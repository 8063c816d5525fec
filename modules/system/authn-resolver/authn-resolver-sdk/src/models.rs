//! Domain models for the `AuthN` resolver.

use gate_security::SecurityContext;
use secrecy::{ExposeSecret, SecretString};

/// Username/password pair decoded from an `Authorization: Basic` header.
///
/// `Debug` redacts the password.
#[derive(Debug, Clone)]
pub struct BasicCredentials {
    username: String,
    password: SecretString,
}

impl BasicCredentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Exposes the password for comparison by a credential store.
    #[must_use]
    pub fn expose_password(&self) -> &str {
        self.password.expose_secret()
    }
}

/// Result of a successful authentication.
///
/// Contains the `SecurityContext` of the verified principal
/// (`subject`, `auth_scheme`, `roles`).
#[derive(Debug, Clone)]
pub struct AuthenticationResult {
    pub security_context: SecurityContext,
}
