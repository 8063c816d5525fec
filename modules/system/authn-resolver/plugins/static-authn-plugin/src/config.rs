//! Configuration for the static `AuthN` resolver plugin.

use secrecy::SecretString;
use serde::Deserialize;

/// Plugin configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticAuthNPluginConfig {
    /// Users accepted by the plugin. Empty means every request is rejected.
    pub users: Vec<UserConfig>,
}

/// A single username/password entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    pub username: String,
    /// Plain password. Redacted from `Debug` output.
    pub password: SecretString,
    /// Roles attached to the principal's `SecurityContext`.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl UserConfig {
    #[must_use]
    pub fn new(username: &str, password: &str, roles: &[&str]) -> Self {
        Self {
            username: username.to_owned(),
            password: SecretString::from(password.to_owned()),
            roles: roles.iter().map(|r| (*r).to_owned()).collect(),
        }
    }
}
