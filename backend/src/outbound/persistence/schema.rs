//! Diesel table definitions.
//!
//! These must match `backend/migrations` exactly; regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Local and federated accounts.
    users (id) {
        id -> Int4,
        /// Login name for local accounts, display name for federated ones.
        username -> Nullable<Varchar>,
        email -> Nullable<Varchar>,
        /// PHC-encoded hash; null for federated accounts.
        password -> Nullable<Varchar>,
        /// One of `local`, `google`, `facebook`.
        provider -> Varchar,
        provider_id -> Nullable<Varchar>,
        /// One of `user`, `admin`.
        role -> Varchar,
        created_at -> Timestamptz,
        /// Always a JSON object.
        preferences -> Jsonb,
    }
}

diesel::table! {
    /// Recommendation history, deleted with the owning account.
    generation_history (id) {
        id -> Int4,
        user_id -> Int4,
        prompt -> Text,
        response -> Text,
        /// 1 to 5 when set.
        rating -> Nullable<Int4>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Server-side session state keyed by the cookie token.
    sessions (token) {
        token -> Varchar,
        /// String-to-string JSON object.
        entries -> Jsonb,
        expires_at -> Timestamptz,
    }
}

diesel::joinable!(generation_history -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(generation_history, sessions, users);
