//! OAuth 2.0 identity provider adapters.

mod dto;
mod provider;

pub use provider::{OAuthClientCredentials, OAuthEndpoints, OAuthIdentityProvider};
