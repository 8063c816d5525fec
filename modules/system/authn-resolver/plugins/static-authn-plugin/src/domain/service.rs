//! Service implementation for the static `AuthN` resolver plugin.

use std::collections::HashMap;

use gate_security::{AuthScheme, SecurityContext};
use secrecy::ExposeSecret;
use subtle::ConstantTimeEq;

use crate::config::{StaticAuthNPluginConfig, UserConfig};
use authn_resolver_sdk::{AuthenticationResult, BasicCredentials};

/// Static `AuthN` resolver service.
///
/// Holds the configured users keyed by username. Later entries with the same
/// username replace earlier ones.
pub struct Service {
    users: HashMap<String, UserConfig>,
}

impl Service {
    /// Create a service from plugin configuration.
    #[must_use]
    pub fn from_config(cfg: &StaticAuthNPluginConfig) -> Self {
        let users: HashMap<String, UserConfig> = cfg
            .users
            .iter()
            .map(|u| (u.username.clone(), u.clone()))
            .collect();

        if users.is_empty() {
            tracing::warn!(
                "Static AuthN plugin has no users configured; every credential check will fail"
            );
        } else {
            tracing::debug!(users = users.len(), "Static AuthN plugin loaded users");
        }

        Self { users }
    }

    /// Number of distinct users known to the service.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Verify a username/password pair and return the identity.
    ///
    /// Returns `None` for an empty username, an unknown username or a wrong password.
    #[must_use]
    pub fn authenticate(&self, credentials: &BasicCredentials) -> Option<AuthenticationResult> {
        if credentials.username().is_empty() {
            return None;
        }

        let user = self.users.get(credentials.username())?;
        if !passwords_match(user, credentials) {
            return None;
        }

        Some(build_result(user))
    }
}

/// Compares without an early exit on the first differing byte.
fn passwords_match(user: &UserConfig, credentials: &BasicCredentials) -> bool {
    let expected = user.password.expose_secret().as_bytes();
    bool::from(expected.ct_eq(credentials.expose_password().as_bytes()))
}

fn build_result(user: &UserConfig) -> AuthenticationResult {
    let ctx = SecurityContext::builder()
        .subject(&user.username)
        .auth_scheme(AuthScheme::Basic)
        .roles(user.roles.clone())
        .build();

    AuthenticationResult {
        security_context: ctx,
    }
}
