//! Test helpers for inbound HTTP components.
//!
//! [`TestWorld`] wires the real domain services over the in-memory fixture
//! adapters, so handler tests exercise the same code paths as the server
//! without a database or network.

use std::sync::Arc;

use actix_session::SessionMiddleware;
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use mockable::DefaultClock;
use serde_json::json;
use url::Url;

use crate::Trace;
use crate::domain::ports::{
    FixtureIdentityProvider, FixtureImageGeneration, FixtureSessions, FixtureStore,
    FixtureTextCompletion, FixtureWeatherSource, IdentityProviders,
};
use crate::domain::{
    AccountManager, AuthProvider, HistoryLedger, RecommendationOrchestrator, RecommendationPorts,
    Registration, User,
};
use crate::outbound::password::Argon2PasswordHasher;

use super::configure;
use super::session_config::SESSION_COOKIE_NAME;
use super::session_store::ServerSessionStore;
use super::state::{HttpState, HttpStatePorts, SiteUrls};

/// Front-end origin used as the post-login redirect in tests.
pub const TEST_APP_URL: &str = "http://localhost:3000/";
/// Authorisation endpoint the fixture identity providers redirect to.
pub const TEST_IDP_URL: &str = "https://idp.example/authorize";

/// Session middleware with a fresh key and its own in-memory sessions.
pub fn test_session_middleware() -> SessionMiddleware<ServerSessionStore> {
    test_session_middleware_with(Key::generate(), FixtureSessions::default())
}

/// Session middleware over `key` and `sessions`, so cookies issued by one
/// test app are accepted by another built from the same pair.
pub fn test_session_middleware_with(
    key: Key,
    sessions: FixtureSessions,
) -> SessionMiddleware<ServerSessionStore> {
    SessionMiddleware::builder(ServerSessionStore::new(Arc::new(sessions)), key)
        .cookie_name(SESSION_COOKIE_NAME.to_owned())
        .cookie_secure(false)
        .build()
}

/// The session cookie set on `res`, if any.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(Cookie::into_owned)
}

/// Fixture-backed handler state plus the session key its apps share.
pub struct TestWorld {
    /// Backing store, exposed for seeding roles and inspecting rows.
    pub store: FixtureStore,
    /// State registered with every app built by [`TestWorld::app`].
    pub state: web::Data<HttpState>,
    /// Session key shared by every app built from this world.
    pub key: Key,
    /// Server-side sessions shared by every app built from this world.
    pub sessions: FixtureSessions,
}

impl TestWorld {
    /// Default world: fixture store, fixture upstreams, and fixture identity
    /// providers for Google and Facebook.
    pub fn new() -> Self {
        Self::customised(|_| {})
    }

    /// World whose ports are adjusted by `adjust` before the state is built,
    /// for swapping in mocks or removing identity providers.
    pub fn customised(adjust: impl FnOnce(&mut HttpStatePorts)) -> Self {
        let store = FixtureStore::default();
        let shared = Arc::new(store.clone());
        let hasher = Arc::new(Argon2PasswordHasher::low_cost().expect("static argon2 params"));
        let recommendations = RecommendationOrchestrator::new(RecommendationPorts {
            completion: Arc::new(FixtureTextCompletion),
            images: Arc::new(FixtureImageGeneration),
            weather: Arc::new(FixtureWeatherSource),
            accounts: shared.clone(),
            history: shared.clone(),
            clock: Arc::new(DefaultClock),
        });
        let idp = Url::parse(TEST_IDP_URL).expect("static url");
        let mut ports = HttpStatePorts {
            accounts: Arc::new(AccountManager::new(shared.clone(), hasher)),
            recommendations: Arc::new(recommendations),
            history: Arc::new(HistoryLedger::new(shared)),
            weather: Arc::new(FixtureWeatherSource),
            identity_providers: IdentityProviders::new()
                .with(Arc::new(FixtureIdentityProvider::new(
                    AuthProvider::Google,
                    idp.clone(),
                )))
                .with(Arc::new(FixtureIdentityProvider::new(
                    AuthProvider::Facebook,
                    idp,
                ))),
        };
        adjust(&mut ports);
        let urls = SiteUrls {
            app_url: Url::parse(TEST_APP_URL).expect("static url"),
            public_url: Url::parse("http://localhost:8080").expect("static url"),
        };
        Self {
            store,
            state: web::Data::new(HttpState::new(ports, urls)),
            key: Key::generate(),
            sessions: FixtureSessions::default(),
        }
    }

    /// Register a local account named `username` with e-mail
    /// `{username}@example.com`.
    pub async fn register(&self, username: &str, password: &str) -> User {
        let email = format!("{username}@example.com");
        let registration =
            Registration::try_from_parts(Some(username), Some(&email), Some(password))
                .expect("valid registration");
        self.state
            .accounts
            .register(&registration)
            .await
            .expect("registration succeeds")
    }

    /// Session middleware sharing this world's key and sessions.
    pub fn session_middleware(&self) -> SessionMiddleware<ServerSessionStore> {
        test_session_middleware_with(self.key.clone(), self.sessions.clone())
    }

    /// Full router with session and trace middleware.
    ///
    /// The app owns clones of the world's handles, so it outlives `&self`.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody + use<>>,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(self.state.clone())
            .wrap(self.session_middleware())
            .wrap(Trace)
            .configure(configure)
    }
}

/// Log in through `POST /login` and return the session cookie.
pub async fn login_cookie(world: &TestWorld, username: &str, password: &str) -> Cookie<'static> {
    let app = test::init_service(world.app()).await;
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/login")
            .set_json(json!({ "username": username, "password": password }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK, "login should succeed");
    session_cookie(&res).expect("login sets a session cookie")
}
