use serde::{Deserialize, Serialize};

/// How the principal of a request proved its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
    /// HTTP Basic authentication (`Authorization: Basic ...`).
    Basic,
}

/// `SecurityContext` carries the identity of the caller for a single request.
///
/// The access gate inserts one into the request extensions before any handler runs:
/// an anonymous context for routes the access policy allows without credentials, and
/// the verified principal for routes that required authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityContext {
    /// Principal name (the basic-auth username). `None` for anonymous requests.
    subject: Option<String>,
    /// Scheme that authenticated the subject. `None` for anonymous requests.
    auth_scheme: Option<AuthScheme>,
    /// Roles granted to the subject by the credential store.
    #[serde(default)]
    roles: Vec<String>,
}

impl SecurityContext {
    /// Create a new `SecurityContext` builder
    #[must_use]
    pub fn builder() -> SecurityContextBuilder {
        SecurityContextBuilder::default()
    }

    /// Create an anonymous `SecurityContext` with no subject and no roles
    #[must_use]
    pub fn anonymous() -> Self {
        SecurityContextBuilder::default().build()
    }

    /// Get the principal name, if the request was authenticated.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    #[must_use]
    pub fn auth_scheme(&self) -> Option<AuthScheme> {
        self.auth_scheme
    }

    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// `true` when a subject was verified for this request.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.subject.is_some()
    }
}

#[derive(Default)]
pub struct SecurityContextBuilder {
    subject: Option<String>,
    auth_scheme: Option<AuthScheme>,
    roles: Vec<String>,
}

impl SecurityContextBuilder {
    #[must_use]
    pub fn subject(mut self, subject: &str) -> Self {
        self.subject = Some(subject.to_owned());
        self
    }

    #[must_use]
    pub fn auth_scheme(mut self, scheme: AuthScheme) -> Self {
        self.auth_scheme = Some(scheme);
        self
    }

    #[must_use]
    pub fn roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    #[must_use]
    pub fn build(self) -> SecurityContext {
        SecurityContext {
            subject: self.subject,
            auth_scheme: self.auth_scheme,
            roles: self.roles,
        }
    }
}
