//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use url::Url;

use crate::domain::AuthProvider;
use crate::domain::ports::{
    AccountService, HistoryService, IdentityProviders, RecommendationService, WeatherSource,
};

/// Parameter object bundling the port implementations used by handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub accounts: Arc<dyn AccountService>,
    pub recommendations: Arc<dyn RecommendationService>,
    pub history: Arc<dyn HistoryService>,
    pub weather: Arc<dyn WeatherSource>,
    pub identity_providers: IdentityProviders,
}

/// Public URLs the HTTP layer redirects to or advertises.
#[derive(Debug, Clone)]
pub struct SiteUrls {
    /// Front-end origin; federated logins end with a redirect here.
    pub app_url: Url,
    /// Externally visible origin of this service.
    pub public_url: Url,
}

impl SiteUrls {
    /// Callback URL registered with `provider`:
    /// `{public_url}/auth/{provider}/callback`.
    ///
    /// # Examples
    /// ```
    /// use url::Url;
    /// use weatherwear::domain::AuthProvider;
    /// use weatherwear::inbound::http::state::SiteUrls;
    ///
    /// let urls = SiteUrls {
    ///     app_url: Url::parse("http://localhost:3000").unwrap(),
    ///     public_url: Url::parse("https://api.example.com/").unwrap(),
    /// };
    /// assert_eq!(
    ///     urls.oauth_callback(AuthProvider::Google).unwrap().as_str(),
    ///     "https://api.example.com/auth/google/callback"
    /// );
    /// ```
    pub fn oauth_callback(&self, provider: AuthProvider) -> Result<Url, url::ParseError> {
        let base = self.public_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/auth/{provider}/callback"))
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountService>,
    pub recommendations: Arc<dyn RecommendationService>,
    pub history: Arc<dyn HistoryService>,
    pub weather: Arc<dyn WeatherSource>,
    pub identity_providers: IdentityProviders,
    pub urls: SiteUrls,
}

impl HttpState {
    /// Construct state from a ports bundle and the site URLs.
    pub fn new(ports: HttpStatePorts, urls: SiteUrls) -> Self {
        let HttpStatePorts {
            accounts,
            recommendations,
            history,
            weather,
            identity_providers,
        } = ports;
        Self {
            accounts,
            recommendations,
            history,
            weather,
            identity_providers,
            urls,
        }
    }
}
