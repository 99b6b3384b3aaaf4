//! Tests for the account service.

use std::sync::Arc;

use chrono::Utc;
use mockall::predicate::eq;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{LocalAccount, MockCredentialStore, MockPasswordHasher};
use crate::domain::{AuthProvider, ErrorCode, PasswordDigest};

type Service = AccountManager<MockCredentialStore, MockPasswordHasher>;

fn make_service(store: MockCredentialStore, hasher: MockPasswordHasher) -> Service {
    AccountManager::new(Arc::new(store), Arc::new(hasher))
}

fn user(id: i32, provider: AuthProvider) -> User {
    User {
        id: UserId::new(id).expect("fixture id"),
        username: Some("alice".to_owned()),
        email: Some("a@x.com".to_owned()),
        provider,
        provider_id: provider.is_federated().then(|| "sub-1".to_owned()),
        role: Role::User,
        preferences: Preferences::new(),
        created_at: Utc::now(),
    }
}

#[fixture]
fn profile() -> FederatedProfile {
    FederatedProfile {
        provider: AuthProvider::Google,
        external_id: "sub-1".to_owned(),
        display_name: Some("Alice".to_owned()),
        email: Some("a@x.com".to_owned()),
    }
}

fn registration() -> Registration {
    Registration::try_from_parts(Some("alice"), Some("a@x.com"), Some("pw")).expect("valid")
}

fn hasher_returning(digest: &'static str) -> MockPasswordHasher {
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .return_once(move |_| Ok(PasswordDigest::new(digest)));
    hasher
}

#[tokio::test]
async fn register_stores_the_hash_not_the_password() {
    let mut store = MockCredentialStore::new();
    store
        .expect_insert_local()
        .withf(|account| account.password.as_str() == "hashed" && account.username == "alice")
        .times(1)
        .return_once(|_| Ok(user(1, AuthProvider::Local)));

    let service = make_service(store, hasher_returning("hashed"));
    let created = service.register(&registration()).await.expect("registered");
    assert_eq!(created.id.as_i32(), 1);
}

#[tokio::test]
async fn register_reports_duplicates_as_already_exists() {
    let mut store = MockCredentialStore::new();
    store
        .expect_insert_local()
        .return_once(|_| Err(CredentialStoreError::duplicate("users_email_key")));

    let service = make_service(store, hasher_returning("hashed"));
    let error = service.register(&registration()).await.expect_err("duplicate");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(error.message(), ALREADY_EXISTS_MESSAGE);
    assert_eq!(error.details(), Some(&json!({ "code": "already_exists" })));
}

#[tokio::test]
async fn register_maps_outages_to_internal_errors() {
    let mut store = MockCredentialStore::new();
    store
        .expect_insert_local()
        .return_once(|_| Err(CredentialStoreError::connection("pool exhausted")));

    let service = make_service(store, hasher_returning("hashed"));
    let error = service.register(&registration()).await.expect_err("outage");
    assert_eq!(error.code(), ErrorCode::InternalError);
}

#[rstest]
#[case(false, false)]
#[case(true, false)]
#[case(true, true)]
#[tokio::test]
async fn local_login_requires_known_user_and_matching_password(
    #[case] known: bool,
    #[case] matches: bool,
) {
    let mut store = MockCredentialStore::new();
    store
        .expect_find_local_account()
        .withf(|username| username == "alice")
        .return_once(move |_| {
            Ok(known.then(|| LocalAccount {
                user: user(1, AuthProvider::Local),
                password: PasswordDigest::new("stored"),
            }))
        });
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_verify()
        .times(usize::from(known))
        .returning(move |_, _| Ok(matches));

    let service = make_service(store, hasher);
    let credentials = LoginCredentials::try_from_parts("alice", "pw").expect("credentials");
    let result = service.authenticate_local(&credentials).await;
    match (known && matches, result) {
        (true, Ok(found)) => assert_eq!(found.id.as_i32(), 1),
        (false, Err(error)) => {
            assert_eq!(error.code(), ErrorCode::Unauthorized);
            assert_eq!(error.message(), INVALID_CREDENTIALS_MESSAGE);
        }
        (expected, other) => panic!("expected success={expected}, got {other:?}"),
    }
}

#[rstest]
#[tokio::test]
async fn federated_login_returns_existing_account(profile: FederatedProfile) {
    let mut store = MockCredentialStore::new();
    store
        .expect_find_by_provider_identity()
        .withf(|provider, external_id| {
            *provider == AuthProvider::Google && external_id == "sub-1"
        })
        .return_once(|_, _| Ok(Some(user(5, AuthProvider::Google))));
    store.expect_insert_federated().never();

    let service = make_service(store, MockPasswordHasher::new());
    let found = service
        .authenticate_federated(&profile)
        .await
        .expect("existing account");
    assert_eq!(found.id.as_i32(), 5);
}

#[rstest]
#[tokio::test]
async fn federated_login_refetches_after_losing_an_insert_race(profile: FederatedProfile) {
    let mut store = MockCredentialStore::new();
    let mut lookups = 0;
    store
        .expect_find_by_provider_identity()
        .times(2)
        .returning(move |_, _| {
            lookups += 1;
            Ok((lookups == 2).then(|| user(9, AuthProvider::Google)))
        });
    store
        .expect_insert_federated()
        .return_once(|_| Err(CredentialStoreError::duplicate("users_provider_identity_key")));

    let service = make_service(store, MockPasswordHasher::new());
    let found = service
        .authenticate_federated(&profile)
        .await
        .expect("winner's account");
    assert_eq!(found.id.as_i32(), 9);
}

#[rstest]
#[tokio::test]
async fn federated_login_rejects_email_owned_by_another_identity(profile: FederatedProfile) {
    let mut store = MockCredentialStore::new();
    store
        .expect_find_by_provider_identity()
        .times(2)
        .returning(|_, _| Ok(None));
    store
        .expect_insert_federated()
        .return_once(|_| Err(CredentialStoreError::duplicate("users_email_key")));

    let service = make_service(store, MockPasswordHasher::new());
    let error = service
        .authenticate_federated(&profile)
        .await
        .expect_err("email collision");
    assert_eq!(error.message(), ALREADY_EXISTS_MESSAGE);
}

#[tokio::test]
async fn listing_asks_for_regular_users_only() {
    let mut store = MockCredentialStore::new();
    store
        .expect_list_by_role()
        .with(eq(Role::User))
        .return_once(|_| Ok(vec![user(2, AuthProvider::Local)]));

    let service = make_service(store, MockPasswordHasher::new());
    let users = service.list_users().await.expect("listing");
    assert_eq!(users.len(), 1);
}

#[rstest]
#[case(true, None)]
#[case(false, Some(ErrorCode::NotFound))]
#[tokio::test]
async fn delete_reports_missing_accounts(
    #[case] deleted: bool,
    #[case] expected: Option<ErrorCode>,
) {
    let mut store = MockCredentialStore::new();
    store.expect_delete().return_once(move |_| Ok(deleted));

    let service = make_service(store, MockPasswordHasher::new());
    let id = UserId::new(3).expect("id");
    let outcome = service.delete_user(id).await.err().map(|error| error.code());
    assert_eq!(outcome, expected);
}

#[tokio::test]
async fn preference_updates_for_vanished_accounts_are_not_found() {
    let mut store = MockCredentialStore::new();
    store.expect_merge_preferences().return_once(|_, _| Ok(false));

    let service = make_service(store, MockPasswordHasher::new());
    let id = UserId::new(3).expect("id");
    let error = service
        .update_preferences(id, &Preferences::new())
        .await
        .expect_err("missing account");
    assert_eq!(error.code(), ErrorCode::NotFound);
}
