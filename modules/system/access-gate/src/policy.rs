//! Access policy evaluation.
//!
//! An [`AccessPolicy`] is an ordered list of [`PolicyRule`]s. Rules are checked in
//! declaration order and the first one whose matcher selects the request decides
//! the outcome. The builder only produces policies that end with an unconditional
//! catch-all, so every request gets exactly one [`Decision`].

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use serde::Serialize;

use crate::config::AccessPolicyConfig;

/// Management endpoints reachable without credentials.
pub const DEFAULT_PUBLIC_ENDPOINTS: &[&str] = &["health", "info"];

/// Outcome of evaluating the access policy for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// Forward the request without a credential check.
    Allow,
    /// Challenge for, and verify, basic-auth credentials before forwarding.
    RequireAuth,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => f.write_str("ALLOW"),
            Self::RequireAuth => f.write_str("REQUIRE_AUTH"),
        }
    }
}

/// Resolved identity of a request target.
///
/// `endpoint` holds the symbolic id (`health`, `metrics`, ...) when the path belongs
/// to an exposed management endpoint, and is `None` for application paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointDescriptor {
    path: String,
    endpoint: Option<String>,
}

impl EndpointDescriptor {
    /// Descriptor for a path that is not a management endpoint.
    #[must_use]
    pub fn application(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            endpoint: None,
        }
    }

    /// Descriptor for a path served by the management endpoint `id`.
    #[must_use]
    pub fn management(path: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            endpoint: Some(id.into()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    #[must_use]
    pub fn is_management(&self) -> bool {
        self.endpoint.is_some()
    }
}

/// Selects the subset of requests a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestMatcher {
    /// Management endpoints whose id is in the set.
    Endpoints(BTreeSet<String>),
    /// Any management endpoint.
    AnyEndpoint,
    /// Every request.
    AnyRequest,
}

impl RequestMatcher {
    /// Matcher for the given management endpoint ids.
    #[must_use]
    pub fn endpoints<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Endpoints(ids.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn matches(&self, descriptor: &EndpointDescriptor) -> bool {
        match self {
            Self::Endpoints(ids) => descriptor.endpoint().is_some_and(|id| ids.contains(id)),
            Self::AnyEndpoint => descriptor.is_management(),
            Self::AnyRequest => true,
        }
    }
}

impl fmt::Display for RequestMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Endpoints(ids) => {
                let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
                write!(f, "endpoint in [{}]", ids.join(", "))
            }
            Self::AnyEndpoint => f.write_str("any endpoint"),
            Self::AnyRequest => f.write_str("any request"),
        }
    }
}

/// A `(matcher, decision)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRule {
    pub matcher: RequestMatcher,
    pub decision: Decision,
}

/// Decision plus the position of the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub decision: Decision,
    /// Index into [`AccessPolicy::rules`]; `None` only if no rule matched.
    pub rule_index: Option<usize>,
}

/// Errors raised while assembling a policy.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("access policy must end with an `any request` rule")]
    MissingCatchAll,

    #[error("rule #{index} follows the `any request` rule and can never match")]
    UnreachableRule { index: usize },

    #[error("public endpoint id must not be empty")]
    EmptyEndpointId,
}

/// Ordered, immutable access policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    rules: Vec<PolicyRule>,
}

static STANDARD_POLICY: LazyLock<AccessPolicy> =
    LazyLock::new(|| AccessPolicy::with_public_endpoints(DEFAULT_PUBLIC_ENDPOINTS.iter().copied()));

impl AccessPolicy {
    #[must_use]
    pub fn builder() -> AccessPolicyBuilder {
        AccessPolicyBuilder::default()
    }

    /// The process-wide default policy: `health` and `info` are public, every other
    /// management endpoint and every other request requires authentication.
    #[must_use]
    pub fn standard() -> &'static AccessPolicy {
        &STANDARD_POLICY
    }

    /// Three-tier policy with the given public endpoint ids.
    #[must_use]
    pub fn with_public_endpoints<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rules: vec![
                PolicyRule {
                    matcher: RequestMatcher::endpoints(ids),
                    decision: Decision::Allow,
                },
                PolicyRule {
                    matcher: RequestMatcher::AnyEndpoint,
                    decision: Decision::RequireAuth,
                },
                PolicyRule {
                    matcher: RequestMatcher::AnyRequest,
                    decision: Decision::RequireAuth,
                },
            ],
        }
    }

    /// Build the three-tier policy from configuration.
    ///
    /// # Errors
    /// Returns [`PolicyError::EmptyEndpointId`] if a public endpoint id is blank.
    pub fn from_config(cfg: &AccessPolicyConfig) -> Result<Self, PolicyError> {
        if cfg.public_endpoints.iter().any(|id| id.trim().is_empty()) {
            return Err(PolicyError::EmptyEndpointId);
        }
        if cfg.public_endpoints.is_empty() {
            tracing::warn!(
                "Access policy has no public endpoints; health checks will require authentication"
            );
        }
        Ok(Self::with_public_endpoints(
            cfg.public_endpoints.iter().map(|id| id.trim().to_owned()),
        ))
    }

    #[must_use]
    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    /// Decide whether the request may proceed without authentication.
    #[must_use]
    pub fn decide(&self, descriptor: &EndpointDescriptor) -> Decision {
        self.evaluate(descriptor).decision
    }

    /// Like [`decide`](Self::decide), also reporting which rule matched.
    #[must_use]
    pub fn evaluate(&self, descriptor: &EndpointDescriptor) -> Evaluation {
        self.rules
            .iter()
            .position(|rule| rule.matcher.matches(descriptor))
            .map_or(
                // The builder guarantees a trailing catch-all; fail closed anyway.
                Evaluation {
                    decision: Decision::RequireAuth,
                    rule_index: None,
                },
                |index| Evaluation {
                    decision: self.rules[index].decision,
                    rule_index: Some(index),
                },
            )
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::standard().clone()
    }
}

/// Collects rules in declaration order.
#[derive(Debug, Default)]
pub struct AccessPolicyBuilder {
    rules: Vec<PolicyRule>,
}

impl AccessPolicyBuilder {
    #[must_use]
    pub fn rule(mut self, matcher: RequestMatcher, decision: Decision) -> Self {
        self.rules.push(PolicyRule { matcher, decision });
        self
    }

    #[must_use]
    pub fn permit(self, matcher: RequestMatcher) -> Self {
        self.rule(matcher, Decision::Allow)
    }

    #[must_use]
    pub fn authenticate(self, matcher: RequestMatcher) -> Self {
        self.rule(matcher, Decision::RequireAuth)
    }

    /// Finish the policy.
    ///
    /// # Errors
    /// - [`PolicyError::MissingCatchAll`] if no `AnyRequest` rule was added
    /// - [`PolicyError::UnreachableRule`] if rules were added after it
    pub fn build(self) -> Result<AccessPolicy, PolicyError> {
        let catch_all = self
            .rules
            .iter()
            .position(|rule| rule.matcher == RequestMatcher::AnyRequest)
            .ok_or(PolicyError::MissingCatchAll)?;

        if catch_all + 1 != self.rules.len() {
            return Err(PolicyError::UnreachableRule {
                index: catch_all + 1,
            });
        }

        Ok(AccessPolicy { rules: self.rules })
    }
}
