//! User accounts and the values attached to them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Validation errors raised by user value constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Store identifiers are positive integers.
    #[error("user id must be a positive integer, got {0}")]
    InvalidId(i32),
    /// Unknown role label.
    #[error("unknown role: {0}")]
    UnknownRole(String),
    /// Unknown identity provider label.
    #[error("unknown identity provider: {0}")]
    UnknownProvider(String),
    /// Preferences must be a JSON object.
    #[error("preferences must be a JSON object")]
    PreferencesNotAnObject,
}

/// Store-assigned user identifier.
///
/// # Examples
/// ```
/// use weatherwear::domain::UserId;
///
/// let id = UserId::new(7).expect("positive id");
/// assert_eq!(id.as_i32(), 7);
/// assert!(UserId::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct UserId(i32);

impl UserId {
    /// Validate and wrap a raw identifier.
    pub fn new(raw: i32) -> Result<Self, UserValidationError> {
        if raw <= 0 {
            return Err(UserValidationError::InvalidId(raw));
        }
        Ok(Self(raw))
    }

    /// Raw integer value used by the store.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for UserId {
    type Error = UserValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for i32 {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authorisation role held by an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular account.
    #[default]
    User,
    /// May manage other accounts.
    Admin,
}

impl Role {
    /// Label stored in the `role` column.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(UserValidationError::UnknownRole(other.to_owned())),
        }
    }
}

/// Where an account's identity is verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    /// Username and password held by this service.
    Local,
    /// Google OAuth.
    Google,
    /// Facebook OAuth.
    Facebook,
}

impl AuthProvider {
    /// Label stored in the `provider` column and used in routes.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Google => "google",
            Self::Facebook => "facebook",
        }
    }

    /// Whether the provider is an external identity provider.
    #[must_use]
    pub fn is_federated(self) -> bool {
        !matches!(self, Self::Local)
    }
}

impl FromStr for AuthProvider {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "google" => Ok(Self::Google),
            "facebook" => Ok(Self::Facebook),
            other => Err(UserValidationError::UnknownProvider(other.to_owned())),
        }
    }
}

impl fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Open-ended preference object attached to an account.
///
/// Merging is shallow: top-level keys from the overlay replace or extend the
/// base, nested objects are replaced wholesale.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use weatherwear::domain::Preferences;
///
/// let base = Preferences::try_from(json!({ "a": 1, "b": 1 })).expect("object");
/// let overlay = Preferences::try_from(json!({ "b": 2 })).expect("object");
/// let merged = base.merged_with(&overlay);
/// assert_eq!(merged.into_value(), json!({ "a": 1, "b": 2 }));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct Preferences(Map<String, Value>);

impl Preferences {
    /// Empty preference object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay `other` onto `self` in place.
    pub fn merge(&mut self, other: &Self) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Return a copy of `self` with `other` overlaid.
    #[must_use]
    pub fn merged_with(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.merge(other);
        merged
    }

    /// Whether no keys are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Convert into a JSON object value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl TryFrom<Value> for Preferences {
    type Error = UserValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(UserValidationError::PreferencesNotAnObject),
        }
    }
}

impl From<Map<String, Value>> for Preferences {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

/// Account record as seen by the domain. Never carries password material.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Store-assigned identifier.
    pub id: UserId,
    /// Login name for local accounts, display name for federated ones.
    pub username: Option<String>,
    /// Primary e-mail address, when known.
    pub email: Option<String>,
    /// Identity provider that owns the account.
    pub provider: AuthProvider,
    /// Identity at the external provider; `None` for local accounts.
    pub provider_id: Option<String>,
    /// Authorisation role.
    pub role: Role,
    /// Stored recommendation preferences.
    pub preferences: Preferences,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether the account may use administrative endpoints.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
