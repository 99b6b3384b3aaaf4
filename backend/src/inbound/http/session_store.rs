//! actix-session storage over the [`SessionRepository`] port.
//!
//! The encrypted cookie holds a random token and nothing else. Purging a
//! session deletes its row, so a copy of the cookie taken before logout no
//! longer resolves to a user.

use std::sync::Arc;

use actix_session::storage::{LoadError, SaveError, SessionKey, SessionStore, UpdateError};
use actix_web::cookie::time::Duration;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::{Clock, DefaultClock};
use rand::distributions::{Alphanumeric, DistString};
use tracing::warn;

use crate::domain::ports::{SessionEntries, SessionRepository};

const TOKEN_LEN: usize = 64;

/// [`SessionStore`] keeping session entries server-side.
#[derive(Clone)]
pub struct ServerSessionStore {
    sessions: Arc<dyn SessionRepository>,
    clock: Arc<dyn Clock>,
}

impl ServerSessionStore {
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self::with_clock(sessions, Arc::new(DefaultClock))
    }

    /// Store whose expiry arithmetic uses `clock`.
    pub fn with_clock(sessions: Arc<dyn SessionRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { sessions, clock }
    }

    fn expiry(&self, ttl: &Duration) -> DateTime<Utc> {
        let ttl = TimeDelta::try_seconds(ttl.whole_seconds()).unwrap_or(TimeDelta::MAX);
        self.clock
            .utc()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    async fn save_new(
        &self,
        entries: SessionEntries,
        ttl: &Duration,
    ) -> Result<SessionKey, anyhow::Error> {
        let token = Alphanumeric.sample_string(&mut rand::thread_rng(), TOKEN_LEN);
        let key = SessionKey::try_from(token.clone())?;
        self.sessions
            .insert(&token, &entries, self.expiry(ttl))
            .await?;
        if let Err(error) = self.sessions.remove_expired(self.clock.utc()).await {
            warn!(%error, "failed to prune expired sessions");
        }
        Ok(key)
    }
}

impl SessionStore for ServerSessionStore {
    async fn load(&self, session_key: &SessionKey) -> Result<Option<SessionEntries>, LoadError> {
        self.sessions
            .load(session_key.as_ref(), self.clock.utc())
            .await
            .map_err(|error| LoadError::Other(error.into()))
    }

    async fn save(
        &self,
        session_state: SessionEntries,
        ttl: &Duration,
    ) -> Result<SessionKey, SaveError> {
        self.save_new(session_state, ttl)
            .await
            .map_err(SaveError::Other)
    }

    async fn update(
        &self,
        session_key: SessionKey,
        session_state: SessionEntries,
        ttl: &Duration,
    ) -> Result<SessionKey, UpdateError> {
        let updated = self
            .sessions
            .update(session_key.as_ref(), &session_state, self.expiry(ttl))
            .await
            .map_err(|error| UpdateError::Other(error.into()))?;
        if updated {
            return Ok(session_key);
        }
        self.save_new(session_state, ttl)
            .await
            .map_err(UpdateError::Other)
    }

    async fn update_ttl(&self, session_key: &SessionKey, ttl: &Duration) -> anyhow::Result<()> {
        self.sessions
            .extend(session_key.as_ref(), self.expiry(ttl))
            .await?;
        Ok(())
    }

    async fn delete(&self, session_key: &SessionKey) -> anyhow::Result<()> {
        self.sessions.remove(session_key.as_ref()).await?;
        Ok(())
    }
}
