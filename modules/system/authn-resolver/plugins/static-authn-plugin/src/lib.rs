#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Static `AuthN` Resolver Plugin
//!
//! Verifies HTTP Basic credentials against a fixed list of users taken from
//! configuration. Intended for development, tests and single-operator
//! deployments; production credential stores implement
//! [`authn_resolver_sdk::AuthNResolverClient`] themselves.
//!
//! ## Configuration
//!
//! ```yaml
//! authn:
//!   users:
//!     - username: "ops"
//!       password: "change-me"
//!       roles: ["ACTUATOR"]
//! ```

pub mod config;
pub mod domain;

pub use config::{StaticAuthNPluginConfig, UserConfig};
pub use domain::service::Service;
