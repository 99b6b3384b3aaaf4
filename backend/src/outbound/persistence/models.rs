//! Internal Diesel row structs.
//!
//! These never leave the persistence layer; conversions into domain types
//! validate labels and identifiers on the way out.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

use crate::domain::{
    AuthProvider, GenerationId, GenerationRecord, Preferences, Rating, Role, User, UserId,
};

use super::schema::{generation_history, sessions, users};

/// Row read from `users`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i32,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub provider: String,
    pub provider_id: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub preferences: Value,
}

impl UserRow {
    /// Convert to a domain user, dropping the password column.
    pub fn into_user(self) -> Result<User, String> {
        let id = UserId::new(self.id).map_err(|err| err.to_string())?;
        let provider = self
            .provider
            .parse::<AuthProvider>()
            .map_err(|err| err.to_string())?;
        let role = self.role.parse::<Role>().map_err(|err| err.to_string())?;
        let preferences = Preferences::try_from(self.preferences).map_err(|err| err.to_string())?;
        Ok(User {
            id,
            username: self.username,
            email: self.email,
            provider,
            provider_id: self.provider_id,
            role,
            preferences,
            created_at: self.created_at,
        })
    }
}

/// Insert payload for `users`; `role`, `preferences` and `created_at` take
/// their column defaults.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub username: Option<&'a str>,
    pub email: Option<&'a str>,
    pub password: Option<&'a str>,
    pub provider: &'a str,
    pub provider_id: Option<&'a str>,
}

/// Row read from `generation_history`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = generation_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct GenerationRow {
    pub id: i32,
    pub user_id: i32,
    pub prompt: String,
    pub response: String,
    pub rating: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl GenerationRow {
    /// Convert to a domain record.
    pub fn into_record(self) -> Result<GenerationRecord, String> {
        let id = GenerationId::new(i64::from(self.id)).map_err(|err| err.to_string())?;
        let user_id = UserId::new(self.user_id).map_err(|err| err.to_string())?;
        let rating = self
            .rating
            .map(|value| Rating::new(i64::from(value)))
            .transpose()
            .map_err(|err| err.to_string())?;
        Ok(GenerationRecord {
            id,
            user_id,
            prompt: self.prompt,
            response: self.response,
            rating,
            created_at: self.created_at,
        })
    }
}

/// Insert payload for `generation_history`.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = generation_history)]
pub(crate) struct NewGenerationRow<'a> {
    pub user_id: i32,
    pub prompt: &'a str,
    pub response: &'a str,
}

/// Insert payload for `sessions`.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sessions)]
pub(crate) struct SessionRow<'a> {
    pub token: &'a str,
    pub entries: Value,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn user_row(provider: &str, role: &str, preferences: Value) -> UserRow {
        UserRow {
            id: 1,
            username: Some("alice".to_owned()),
            email: None,
            password: Some("$argon2id$...".to_owned()),
            provider: provider.to_owned(),
            provider_id: None,
            role: role.to_owned(),
            created_at: Utc::now(),
            preferences,
        }
    }

    #[rstest]
    fn user_rows_convert_labels() {
        let user = user_row("google", "admin", json!({ "k": 1 }))
            .into_user()
            .expect("valid row");
        assert_eq!(user.provider, AuthProvider::Google);
        assert!(user.is_admin());
    }

    #[rstest]
    #[case(user_row("github", "user", json!({})))]
    #[case(user_row("local", "root", json!({})))]
    #[case(user_row("local", "user", json!([])))]
    fn invalid_user_rows_are_rejected(#[case] row: UserRow) {
        assert!(row.into_user().is_err());
    }

    #[rstest]
    #[case(None, true)]
    #[case(Some(3), true)]
    #[case(Some(9), false)]
    fn generation_rows_validate_ratings(#[case] rating: Option<i32>, #[case] valid: bool) {
        let row = GenerationRow {
            id: 2,
            user_id: 1,
            prompt: "{}".to_owned(),
            response: "{}".to_owned(),
            rating,
            created_at: Utc::now(),
        };
        assert_eq!(row.into_record().is_ok(), valid);
    }
}
