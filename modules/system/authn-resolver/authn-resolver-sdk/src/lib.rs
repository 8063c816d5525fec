#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! `AuthN` Resolver SDK
//!
//! This crate provides the credential-verification seam used by the access gate:
//!
//! - [`AuthNResolverClient`] - Trait implemented by credential stores
//! - [`BasicCredentials`] - Username/password pair taken from an `Authorization: Basic` header
//! - [`AuthenticationResult`] - Authentication result model
//! - [`AuthNResolverError`] - Error types
//!
//! ## Usage
//!
//! ```ignore
//! use authn_resolver_sdk::{AuthNResolverClient, BasicCredentials};
//!
//! let creds = BasicCredentials::new("ops", "s3cret");
//! let result = authn.authenticate(&creds).await?;
//! let security_context = result.security_context;
//! ```

pub mod api;
pub mod error;
pub mod models;

// Re-export main types at crate root
pub use api::AuthNResolverClient;
pub use error::AuthNResolverError;
pub use models::{AuthenticationResult, BasicCredentials};
