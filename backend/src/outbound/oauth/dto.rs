//! Wire types shared by the OAuth token and profile endpoints.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(super) struct TokenResponseDto {
    pub access_token: String,
}

/// Profile returned by Google's userinfo (`sub`) or Facebook's Graph `/me`
/// (`id`).
#[derive(Debug, Deserialize)]
pub(super) struct ProfileDto {
    #[serde(alias = "sub")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}
