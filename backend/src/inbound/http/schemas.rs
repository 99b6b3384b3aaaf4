//! Response bodies shared across handlers.
//!
//! Domain entities do not serialise themselves for the wire; these views
//! pick the fields each endpoint exposes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AuthProvider, Preferences, Role, User};

/// `{ "message": ... }` acknowledgement returned by mutations.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Human-readable outcome.
    #[schema(example = "Rating saved successfully")]
    pub message: String,
}

impl MessageResponse {
    /// Wrap a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Identity returned by a successful local login.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub username: Option<String>,
    pub email: Option<String>,
}

impl From<&User> for LoginResponse {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// Profile of the signed-in caller.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CurrentUserResponse {
    pub username: Option<String>,
    pub email: Option<String>,
    pub preferences: Preferences,
    pub role: Role,
    pub provider: AuthProvider,
}

impl From<User> for CurrentUserResponse {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            email: user.email,
            preferences: user.preferences,
            role: user.role,
            provider: user.provider,
        }
    }
}

/// Row in the admin user listing.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    #[schema(example = 7)]
    pub id: i32,
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Role,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id.as_i32(),
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}
