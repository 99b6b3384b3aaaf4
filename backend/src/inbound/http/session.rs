//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Only the user id and, during a federated login, the pending OAuth state
//! are ever written to the session.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{AuthProvider, Error, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";
const OAUTH_STATE_KEY_PREFIX: &str = "oauth_state";

fn oauth_state_key(provider: AuthProvider) -> String {
    format!("{OAUTH_STATE_KEY_PREFIX}:{provider}")
}

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Bind the session to `user_id`.
    ///
    /// The session id is renewed first so a pre-login cookie cannot be
    /// reused after authentication.
    pub fn persist_user(&self, user_id: UserId) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, user_id.as_i32())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Current user id, if the session carries a valid one.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        let raw = self
            .0
            .get::<i32>(USER_ID_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        Ok(raw.and_then(|raw| match UserId::new(raw) {
            Ok(id) => Some(id),
            Err(error) => {
                warn!(%error, "invalid user id in session cookie");
                None
            }
        }))
    }

    /// Delete the server-side session and expire the cookie.
    ///
    /// The stored entries are removed, so a copy of the cookie kept from
    /// before this call no longer identifies anyone.
    pub fn purge(&self) {
        self.0.purge();
    }

    /// Remember the anti-forgery state for a pending federated login.
    pub fn remember_oauth_state(&self, provider: AuthProvider, state: &str) -> Result<(), Error> {
        self.0
            .insert(oauth_state_key(provider), state)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Remove and return the pending OAuth state for `provider`.
    ///
    /// The state is single-use: it is gone after this call whatever the
    /// outcome of the callback.
    pub fn take_oauth_state(&self, provider: AuthProvider) -> Result<Option<String>, Error> {
        self.0
            .remove_as::<String>(&oauth_state_key(provider))
            .transpose()
            .map_err(|raw| {
                Error::internal(format!("failed to read OAuth state from session: {raw}"))
            })
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
