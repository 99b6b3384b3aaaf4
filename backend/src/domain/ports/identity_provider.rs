//! Driven port for OAuth 2.0 identity providers.
//!
//! Each provider builds its own authorisation URL and turns a callback code
//! into a [`FederatedProfile`]. [`IdentityProviders`] holds the configured
//! set; an absent entry means the provider is unavailable.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::domain::{AuthProvider, FederatedProfile};

use super::UpstreamServiceError;

/// Port for one external identity provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provider this adapter speaks to.
    fn provider(&self) -> AuthProvider;

    /// URL the browser is sent to, carrying the anti-forgery `state`.
    fn authorization_url(&self, state: &str) -> Result<Url, UpstreamServiceError>;

    /// Exchange an authorisation code for the caller's profile.
    async fn exchange_code(&self, code: &str) -> Result<FederatedProfile, UpstreamServiceError>;
}

/// Configured identity providers keyed by provider.
#[derive(Clone, Default)]
pub struct IdentityProviders {
    providers: HashMap<AuthProvider, Arc<dyn IdentityProvider>>,
}

impl IdentityProviders {
    /// Empty registry; every federated route reports the provider unavailable.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `adapter` under the provider it reports.
    #[must_use]
    pub fn with(mut self, adapter: Arc<dyn IdentityProvider>) -> Self {
        self.providers.insert(adapter.provider(), adapter);
        self
    }

    /// Adapter for `provider`, when configured.
    #[must_use]
    pub fn get(&self, provider: AuthProvider) -> Option<Arc<dyn IdentityProvider>> {
        self.providers.get(&provider).cloned()
    }
}

/// Fixture provider that echoes the code back as the external identity.
///
/// The authorisation URL points at `base` with the state appended, and
/// `exchange_code("abc")` yields a profile with id `abc`, display name
/// `Fixture abc` and e-mail `abc@{provider}.example`.
#[derive(Debug, Clone)]
pub struct FixtureIdentityProvider {
    provider: AuthProvider,
    base: Url,
}

impl FixtureIdentityProvider {
    /// Build a fixture for `provider` redirecting to `base`.
    #[must_use]
    pub fn new(provider: AuthProvider, base: Url) -> Self {
        Self { provider, base }
    }
}

#[async_trait]
impl IdentityProvider for FixtureIdentityProvider {
    fn provider(&self) -> AuthProvider {
        self.provider
    }

    fn authorization_url(&self, state: &str) -> Result<Url, UpstreamServiceError> {
        let mut url = self.base.clone();
        url.query_pairs_mut().append_pair("state", state);
        Ok(url)
    }

    async fn exchange_code(&self, code: &str) -> Result<FederatedProfile, UpstreamServiceError> {
        if code.is_empty() {
            return Err(UpstreamServiceError::status(400_u16, "empty authorisation code"));
        }
        Ok(FederatedProfile {
            provider: self.provider,
            external_id: code.to_owned(),
            display_name: Some(format!("Fixture {code}")),
            email: Some(format!("{code}@{}.example", self.provider)),
        })
    }
}
