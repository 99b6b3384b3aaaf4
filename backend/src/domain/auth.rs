//! Authentication primitives: login credentials, registration input, and
//! federated profiles.
//!
//! Constructors validate raw strings so handlers never pass unchecked input
//! to a service or port.

use zeroize::Zeroizing;

use super::AuthProvider;

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    /// Username was missing or blank once trimmed.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `username` is trimmed and must not be empty after trimming.
/// - `password` is non-empty; caller whitespace is preserved.
///
/// # Examples
/// ```
/// use weatherwear::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" alice ", "pw").expect("valid");
/// assert_eq!(creds.username(), "alice");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = username.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyUsername);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            username: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Username used for the local-account lookup.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Field named by a registration validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationField {
    /// `username`
    Username,
    /// `email`
    Email,
    /// `password`
    Password,
}

impl RegistrationField {
    /// Wire name of the field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
            Self::Password => "password",
        }
    }
}

/// Validation failures for [`Registration`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationValidationError {
    /// A required field was absent or blank.
    #[error("{} is required", .0.as_str())]
    MissingField(RegistrationField),
    /// The e-mail address is not plausibly an address.
    #[error("email address is malformed")]
    MalformedEmail,
}

/// Validated input for creating a local account.
#[derive(Clone, PartialEq, Eq)]
pub struct Registration {
    username: String,
    email: String,
    password: Zeroizing<String>,
}

impl Registration {
    /// Validate raw registration fields. `None` and blank values are treated
    /// alike.
    ///
    /// # Examples
    /// ```
    /// use weatherwear::domain::{Registration, RegistrationField, RegistrationValidationError};
    ///
    /// let err = Registration::try_from_parts(Some("alice"), None, Some("pw")).unwrap_err();
    /// assert_eq!(err, RegistrationValidationError::MissingField(RegistrationField::Email));
    /// ```
    pub fn try_from_parts(
        username: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self, RegistrationValidationError> {
        let username = required(username, RegistrationField::Username)?.trim();
        let email = required(email, RegistrationField::Email)?.trim();
        let password = required(password, RegistrationField::Password)?;
        if !is_plausible_email(email) {
            return Err(RegistrationValidationError::MalformedEmail);
        }
        Ok(Self {
            username: username.to_owned(),
            email: email.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Requested login name.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Contact e-mail address.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Plain-text password; hash before storing.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

fn required(
    value: Option<&str>,
    field: RegistrationField,
) -> Result<&str, RegistrationValidationError> {
    match value {
        Some(raw) if !raw.trim().is_empty() => Ok(raw),
        _ => Err(RegistrationValidationError::MissingField(field)),
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Salted password hash in PHC string format.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Wrap an encoded hash read from the store or produced by a hasher.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Encoded PHC string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordDigest(..)")
    }
}

/// Identity asserted by an external provider after a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedProfile {
    /// Provider that asserted the identity.
    pub provider: AuthProvider,
    /// Stable subject identifier at the provider.
    pub external_id: String,
    /// Human-readable name, when shared.
    pub display_name: Option<String>,
    /// Primary e-mail, when shared.
    pub email: Option<String>,
}

impl FederatedProfile {
    /// Name to store as the account's username: the display name, then the
    /// e-mail, then a provider-derived label.
    pub fn preferred_username(&self) -> String {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map_or_else(|| format!("{} user", self.provider), str::to_owned)
    }
}
