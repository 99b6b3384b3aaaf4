//! Parsing of the session environment toggles.
//!
//! Debug builds fall back to a default and log the problem; release builds
//! turn the same problem into a [`SessionConfigError`].

use actix_web::cookie::SameSite;
use mockable::Env;
use tracing::warn;

use super::{BuildMode, SAMESITE_ENV, SessionConfigError};

const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// `fallback` in debug builds, `error` in release builds.
pub(super) fn lenient<T>(
    mode: BuildMode,
    fallback: T,
    error: SessionConfigError,
) -> Result<T, SessionConfigError> {
    match mode {
        BuildMode::Debug => {
            warn!(%error, "session setting ignored in debug build; using default");
            Ok(fallback)
        }
        BuildMode::Release => Err(error),
    }
}

/// A boolean environment toggle with a debug-build default.
pub(super) struct Toggle {
    name: &'static str,
    default: bool,
}

impl Toggle {
    pub(super) const fn new(name: &'static str, default: bool) -> Self {
        Self { name, default }
    }

    /// Read the toggle from `env`.
    pub(super) fn read<E: Env>(
        &self,
        env: &E,
        mode: BuildMode,
    ) -> Result<bool, SessionConfigError> {
        let Some(raw) = env.string(self.name) else {
            return lenient(
                mode,
                self.default,
                SessionConfigError::MissingEnv { name: self.name },
            );
        };
        match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "y" => Ok(true),
            "0" | "false" | "no" | "n" => Ok(false),
            _ => lenient(
                mode,
                self.default,
                SessionConfigError::InvalidEnv {
                    name: self.name,
                    value: raw,
                    expected: BOOL_EXPECTED,
                },
            ),
        }
    }
}

/// Parse a `SESSION_SAMESITE` value.
///
/// `None` requires a secure cookie; debug builds only warn about it.
pub(super) fn parse_same_site(
    raw: String,
    mode: BuildMode,
    cookie_secure: bool,
    fallback: SameSite,
) -> Result<SameSite, SessionConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "strict" => Ok(SameSite::Strict),
        "lax" => Ok(SameSite::Lax),
        "none" if cookie_secure => Ok(SameSite::None),
        "none" => lenient(mode, (), SessionConfigError::InsecureSameSiteNone)
            .map(|()| SameSite::None),
        _ => lenient(
            mode,
            fallback,
            SessionConfigError::InvalidEnv {
                name: SAMESITE_ENV,
                value: raw,
                expected: SAMESITE_EXPECTED,
            },
        ),
    }
}
