#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Management access gate.
//!
//! Decides, per request, whether a management/observability endpoint may be
//! reached anonymously or only with HTTP Basic credentials, and enforces that
//! decision as `axum` middleware.
//!
//! - [`policy`]: ordered, first-match-wins access rules and the [`AccessPolicy::decide`] evaluator
//! - [`endpoints`]: request path -> management endpoint id resolution
//! - [`auth`]: basic-auth middleware consulting an [`authn_resolver_sdk::AuthNResolverClient`]
//! - [`gate`]: [`AccessGate`], which wires the above onto a router
//!
//! ```ignore
//! let authn: Arc<dyn AuthNResolverClient> = Arc::new(static_authn_plugin::Service::from_config(&users));
//! let gate = AccessGate::new(GateConfig::default(), authn)?;
//! let app = gate.apply(Router::new().route("/actuator/health", get(health)));
//! ```

pub mod auth;
pub mod config;
pub mod endpoints;
pub mod gate;
pub mod policy;
pub mod problem;

pub use config::{AccessPolicyConfig, GateConfig, ManagementConfig};
pub use endpoints::{DISCOVERY_ENDPOINT, EndpointConfigError, EndpointResolver};
pub use gate::{AccessGate, GateError};
pub use policy::{
    AccessPolicy, DEFAULT_PUBLIC_ENDPOINTS, Decision, EndpointDescriptor, Evaluation, PolicyError,
    PolicyRule, RequestMatcher,
};
pub use problem::Problem;
