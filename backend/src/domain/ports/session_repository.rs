//! Driven port for server-side session state.
//!
//! The session cookie only carries an opaque token; the entries it points at
//! live behind this port, so removing a row revokes every copy of the cookie.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::define_port_error;

/// Key/value pairs written by the session middleware.
pub type SessionEntries = HashMap<String, String>;

define_port_error! {
    /// Errors raised by session repository adapters.
    pub enum SessionRepositoryError {
        /// Connection could not be checked out.
        Connection { message: String } =>
            "session store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "session store query failed: {message}",
    }
}

/// Port for persisting sessions keyed by their cookie token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Entries for `token`, unless it is unknown or expired at `now`.
    async fn load(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionEntries>, SessionRepositoryError>;

    /// Store a new session.
    async fn insert(
        &self,
        token: &str,
        entries: &SessionEntries,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionRepositoryError>;

    /// Replace the entries of an existing session.
    ///
    /// Returns `false` when `token` is not stored, so a revoked session is
    /// never brought back.
    async fn update(
        &self,
        token: &str,
        entries: &SessionEntries,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, SessionRepositoryError>;

    /// Move the expiry of `token`. Unknown tokens are ignored.
    async fn extend(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionRepositoryError>;

    /// Forget `token`. Unknown tokens are ignored.
    async fn remove(&self, token: &str) -> Result<(), SessionRepositoryError>;

    /// Drop every session that expired before `now`; returns how many went.
    async fn remove_expired(&self, now: DateTime<Utc>) -> Result<usize, SessionRepositoryError>;
}

type Rows = HashMap<String, (SessionEntries, DateTime<Utc>)>;

/// In-memory sessions for runs without a database and for tests.
#[derive(Clone, Default)]
pub struct FixtureSessions {
    rows: Arc<Mutex<Rows>>,
}

impl FixtureSessions {
    /// Number of stored sessions, expired ones included.
    pub fn stored(&self) -> usize {
        self.lock().map(|rows| rows.len()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Rows>, SessionRepositoryError> {
        self.rows
            .lock()
            .map_err(|_| SessionRepositoryError::connection("fixture session lock poisoned"))
    }
}

#[async_trait]
impl SessionRepository for FixtureSessions {
    async fn load(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionEntries>, SessionRepositoryError> {
        let rows = self.lock()?;
        Ok(rows
            .get(token)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(entries, _)| entries.clone()))
    }

    async fn insert(
        &self,
        token: &str,
        entries: &SessionEntries,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionRepositoryError> {
        let mut rows = self.lock()?;
        if rows.contains_key(token) {
            return Err(SessionRepositoryError::query("session token already stored"));
        }
        rows.insert(token.to_owned(), (entries.clone(), expires_at));
        Ok(())
    }

    async fn update(
        &self,
        token: &str,
        entries: &SessionEntries,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, SessionRepositoryError> {
        let mut rows = self.lock()?;
        Ok(match rows.get_mut(token) {
            Some(row) => {
                *row = (entries.clone(), expires_at);
                true
            }
            None => false,
        })
    }

    async fn extend(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionRepositoryError> {
        if let Some(row) = self.lock()?.get_mut(token) {
            row.1 = expires_at;
        }
        Ok(())
    }

    async fn remove(&self, token: &str) -> Result<(), SessionRepositoryError> {
        self.lock()?.remove(token);
        Ok(())
    }

    async fn remove_expired(&self, now: DateTime<Utc>) -> Result<usize, SessionRepositoryError> {
        let mut rows = self.lock()?;
        let before = rows.len();
        rows.retain(|_, (_, expires_at)| *expires_at > now);
        Ok(before - rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::{fixture, rstest};

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn entries(user_id: &str) -> SessionEntries {
        HashMap::from([("user_id".to_owned(), user_id.to_owned())])
    }

    #[rstest]
    #[tokio::test]
    async fn expired_sessions_are_invisible_and_pruned(now: DateTime<Utc>) {
        let sessions = FixtureSessions::default();
        sessions
            .insert("live", &entries("1"), now + Duration::hours(1))
            .await
            .expect("insert");
        sessions
            .insert("stale", &entries("2"), now - Duration::seconds(1))
            .await
            .expect("insert");

        assert_eq!(
            sessions.load("live", now).await.expect("load"),
            Some(entries("1"))
        );
        assert_eq!(sessions.load("stale", now).await.expect("load"), None);
        assert_eq!(sessions.remove_expired(now).await.expect("prune"), 1);
        assert_eq!(sessions.stored(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn removed_tokens_cannot_be_updated_back(now: DateTime<Utc>) {
        let sessions = FixtureSessions::default();
        let later = now + Duration::hours(1);
        sessions.insert("t", &entries("1"), later).await.expect("insert");
        assert!(sessions.update("t", &entries("2"), later).await.expect("update"));
        sessions.remove("t").await.expect("remove");

        assert!(!sessions.update("t", &entries("3"), later).await.expect("update"));
        assert_eq!(sessions.load("t", now).await.expect("load"), None);
    }

    #[rstest]
    #[tokio::test]
    async fn extending_moves_the_expiry(now: DateTime<Utc>) {
        let sessions = FixtureSessions::default();
        sessions
            .insert("t", &entries("1"), now + Duration::minutes(1))
            .await
            .expect("insert");
        sessions
            .extend("t", now + Duration::hours(2))
            .await
            .expect("extend");
        let later = now + Duration::hours(1);
        assert!(sessions.load("t", later).await.expect("load").is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_tokens_are_rejected(now: DateTime<Utc>) {
        let sessions = FixtureSessions::default();
        sessions.insert("t", &entries("1"), now).await.expect("insert");
        let err = sessions
            .insert("t", &entries("2"), now)
            .await
            .expect_err("duplicate token");
        assert!(matches!(err, SessionRepositoryError::Query { .. }));
    }
}
