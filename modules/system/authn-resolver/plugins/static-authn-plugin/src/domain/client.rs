//! Client implementation for the static `AuthN` resolver plugin.
//!
//! Implements `AuthNResolverClient` using the domain service.

use async_trait::async_trait;
use authn_resolver_sdk::{
    AuthNResolverClient, AuthNResolverError, AuthenticationResult, BasicCredentials,
};

use super::service::Service;

#[async_trait]
impl AuthNResolverClient for Service {
    async fn authenticate(
        &self,
        credentials: &BasicCredentials,
    ) -> Result<AuthenticationResult, AuthNResolverError> {
        self.authenticate(credentials)
            .ok_or_else(|| AuthNResolverError::Unauthorized("bad credentials".to_owned()))
    }
}
