//! Authorisation-code flow against Google and Facebook.
//!
//! The browser leg (`authorization_url`) is pure URL building. The server leg
//! swaps the code for an access token and reads the profile with it; the
//! token is used once and never stored or logged.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use zeroize::Zeroizing;

use super::dto::{ProfileDto, TokenResponseDto};
use crate::domain::ports::{IdentityProvider, UpstreamServiceError};
use crate::domain::{AuthProvider, FederatedProfile};
use crate::outbound::http_support::{build_client, decode, map_transport_error, read_success};

/// How a provider expects the code exchange to be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenRequestStyle {
    /// `application/x-www-form-urlencoded` POST body.
    FormPost,
    /// Query parameters on a GET.
    Query,
}

/// Provider endpoints and scope.
#[derive(Debug, Clone)]
pub struct OAuthEndpoints {
    authorize: Url,
    token: Url,
    profile: Url,
    scope: &'static str,
    token_style: TokenRequestStyle,
}

impl OAuthEndpoints {
    /// Google OAuth 2.0 and OpenID Connect userinfo.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the URLs are constants.
    pub fn google() -> Result<Self, url::ParseError> {
        Ok(Self {
            authorize: Url::parse("https://accounts.google.com/o/oauth2/v2/auth")?,
            token: Url::parse("https://oauth2.googleapis.com/token")?,
            profile: Url::parse("https://openidconnect.googleapis.com/v1/userinfo")?,
            scope: "openid profile email",
            token_style: TokenRequestStyle::FormPost,
        })
    }

    /// Facebook Login and Graph API.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the URLs are constants.
    pub fn facebook() -> Result<Self, url::ParseError> {
        Ok(Self {
            authorize: Url::parse("https://www.facebook.com/v18.0/dialog/oauth")?,
            token: Url::parse("https://graph.facebook.com/v18.0/oauth/access_token")?,
            profile: Url::parse("https://graph.facebook.com/v18.0/me?fields=id,name,email")?,
            scope: "email public_profile",
            token_style: TokenRequestStyle::Query,
        })
    }
}

/// Registered client credentials.
pub struct OAuthClientCredentials {
    /// Public client id.
    pub client_id: String,
    /// Client secret.
    pub client_secret: Zeroizing<String>,
    /// Callback URL registered with the provider.
    pub redirect_uri: Url,
}

/// [`IdentityProvider`] speaking the authorisation-code flow.
pub struct OAuthIdentityProvider {
    provider: AuthProvider,
    client: Client,
    endpoints: OAuthEndpoints,
    credentials: OAuthClientCredentials,
}

impl OAuthIdentityProvider {
    /// Build an adapter for `provider`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        provider: AuthProvider,
        endpoints: OAuthEndpoints,
        credentials: OAuthClientCredentials,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            provider,
            client: build_client(timeout)?,
            endpoints,
            credentials,
        })
    }

    async fn exchange_token(&self, code: &str) -> Result<Zeroizing<String>, UpstreamServiceError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("redirect_uri", self.credentials.redirect_uri.as_str()),
        ];
        let request = match self.endpoints.token_style {
            TokenRequestStyle::FormPost => {
                self.client.post(self.endpoints.token.clone()).form(&params)
            }
            TokenRequestStyle::Query => {
                self.client.get(self.endpoints.token.clone()).query(&params)
            }
        };
        let response = request.send().await.map_err(map_transport_error)?;
        let body = read_success(response).await?;
        let token: TokenResponseDto = decode(&body, "token")?;
        Ok(Zeroizing::new(token.access_token))
    }
}

fn authorization_url(
    endpoints: &OAuthEndpoints,
    credentials: &OAuthClientCredentials,
    state: &str,
) -> Url {
    let mut url = endpoints.authorize.clone();
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", &credentials.client_id)
        .append_pair("redirect_uri", credentials.redirect_uri.as_str())
        .append_pair("scope", endpoints.scope)
        .append_pair("state", state);
    url
}

fn parse_profile(
    provider: AuthProvider,
    body: &[u8],
) -> Result<FederatedProfile, UpstreamServiceError> {
    let profile: ProfileDto = decode(body, "profile")?;
    if profile.id.trim().is_empty() {
        return Err(UpstreamServiceError::decode("profile has an empty subject"));
    }
    Ok(FederatedProfile {
        provider,
        external_id: profile.id,
        display_name: profile.name.filter(|name| !name.trim().is_empty()),
        email: profile.email.filter(|email| !email.trim().is_empty()),
    })
}

#[async_trait]
impl IdentityProvider for OAuthIdentityProvider {
    fn provider(&self) -> AuthProvider {
        self.provider
    }

    fn authorization_url(&self, state: &str) -> Result<Url, UpstreamServiceError> {
        Ok(authorization_url(&self.endpoints, &self.credentials, state))
    }

    async fn exchange_code(&self, code: &str) -> Result<FederatedProfile, UpstreamServiceError> {
        let access_token = self.exchange_token(code).await?;
        let response = self
            .client
            .get(self.endpoints.profile.clone())
            .bearer_auth(access_token.as_str())
            .send()
            .await
            .map_err(map_transport_error)?;
        let body = read_success(response).await?;
        parse_profile(self.provider, &body)
    }
}
