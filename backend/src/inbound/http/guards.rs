//! Authentication and authorisation extractors.
//!
//! A handler that takes [`AuthenticatedUser`] or [`AdminUser`] never runs for
//! a caller who fails the check: extraction short-circuits with 401 or 403.
//! The session only holds the user id; each request resolves it back to the
//! stored account, so a deleted user is treated as anonymous.

use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, User};

use super::session::SessionContext;
use super::state::HttpState;

/// Message for requests that need a session but have none.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";
/// Message for authenticated callers without the admin role.
pub const ADMIN_ONLY_MESSAGE: &str = "Access forbidden: Admins only";

async fn resolve_user(
    session: &SessionContext,
    state: &HttpState,
) -> Result<Option<User>, Error> {
    let Some(id) = session.user_id()? else {
        return Ok(None);
    };
    let user = state.accounts.resolve_session_user(id).await?;
    if user.is_none() {
        warn!(user_id = %id, "session refers to a user that no longer exists");
        session.purge();
    }
    Ok(user)
}

fn extract<T, F>(
    req: &HttpRequest,
    payload: &mut Payload,
    finish: F,
) -> LocalBoxFuture<'static, Result<T, Error>>
where
    T: 'static,
    F: FnOnce(Option<User>, SessionContext) -> Result<T, Error> + 'static,
{
    let session = SessionContext::from_request(req, payload);
    let state = req.app_data::<web::Data<HttpState>>().cloned();
    Box::pin(async move {
        let session = session.await?;
        let state = state.ok_or_else(|| Error::internal("HTTP state is not registered"))?;
        let user = resolve_user(&session, &state).await?;
        finish(user, session)
    })
}

/// The caller's account, if the session resolves to one.
pub struct MaybeUser(pub Option<User>);

impl FromRequest for MaybeUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        extract(req, payload, |user, _| Ok(Self(user)))
    }
}

/// An authenticated caller. Extraction fails with 401 otherwise.
pub struct AuthenticatedUser {
    /// Resolved account.
    pub user: User,
    /// Session the account was resolved from.
    pub session: SessionContext,
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        extract(req, payload, |user, session| match user {
            Some(user) => Ok(Self { user, session }),
            None => Err(Error::unauthorized(UNAUTHORIZED_MESSAGE)),
        })
    }
}

/// An authenticated caller holding the admin role. Extraction fails with
/// 401 without a session and 403 for any other role.
pub struct AdminUser(pub User);

impl FromRequest for AdminUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        extract(req, payload, |user, _| match user {
            Some(user) if user.is_admin() => Ok(Self(user)),
            Some(user) => {
                warn!(user_id = %user.id, "non-admin attempted an admin operation");
                Err(Error::forbidden(ADMIN_ONLY_MESSAGE))
            }
            None => Err(Error::unauthorized(UNAUTHORIZED_MESSAGE)),
        })
    }
}
