//! End-to-end HTTP flow over the in-memory adapters.
//!
//! Builds the application from the crate's public surface, the way the
//! server binary does, and walks a user from registration to a rated,
//! regenerated recommendation.

use std::sync::Arc;

use actix_web::cookie::{Cookie, Key, SameSite};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use mockable::DefaultClock;
use serde_json::{Value, json};
use url::Url;

use weatherwear::Trace;
use weatherwear::domain::ports::{
    FIXTURE_IMAGE_URL, FixtureImageGeneration, FixtureSessions, FixtureStore,
    FixtureTextCompletion, FixtureWeatherSource, IdentityProviders,
};
use weatherwear::domain::{
    AccountManager, HistoryLedger, RecommendationOrchestrator, RecommendationPorts, Role,
    UserId,
};
use weatherwear::inbound::http::configure;
use weatherwear::inbound::http::session_config::{SESSION_COOKIE_NAME, SessionSettings};
use weatherwear::inbound::http::session_store::ServerSessionStore;
use weatherwear::inbound::http::state::{HttpState, HttpStatePorts, SiteUrls};
use weatherwear::outbound::password::Argon2PasswordHasher;

struct Harness {
    store: FixtureStore,
    state: web::Data<HttpState>,
    session: SessionSettings,
    sessions: FixtureSessions,
}

impl Harness {
    fn new() -> Self {
        let store = FixtureStore::default();
        let shared = Arc::new(store.clone());
        let hasher = Arc::new(Argon2PasswordHasher::low_cost().expect("argon2 params"));
        let recommendations = RecommendationOrchestrator::new(RecommendationPorts {
            completion: Arc::new(FixtureTextCompletion),
            images: Arc::new(FixtureImageGeneration),
            weather: Arc::new(FixtureWeatherSource),
            accounts: shared.clone(),
            history: shared.clone(),
            clock: Arc::new(DefaultClock),
        });
        let ports = HttpStatePorts {
            accounts: Arc::new(AccountManager::new(shared.clone(), hasher)),
            recommendations: Arc::new(recommendations),
            history: Arc::new(HistoryLedger::new(shared)),
            weather: Arc::new(FixtureWeatherSource),
            identity_providers: IdentityProviders::new(),
        };
        let urls = SiteUrls {
            app_url: Url::parse("http://localhost:3000").expect("static url"),
            public_url: Url::parse("http://localhost:8080").expect("static url"),
        };
        Self {
            store,
            state: web::Data::new(HttpState::new(ports, urls)),
            session: SessionSettings {
                key: Key::generate(),
                cookie_secure: false,
                same_site: SameSite::Lax,
            },
            sessions: FixtureSessions::default(),
        }
    }

    async fn send(&self, req: test::TestRequest) -> ServiceResponse {
        let app = test::init_service(
            App::new()
                .app_data(self.state.clone())
                .wrap(
                    self.session
                        .middleware(ServerSessionStore::new(Arc::new(self.sessions.clone()))),
                )
                .wrap(Trace)
                .configure(configure),
        )
        .await;
        app.call(req.to_request()).await.expect("request handled")
    }

    async fn json(&self, req: test::TestRequest) -> (StatusCode, Value) {
        let res = self.send(req).await;
        let status = res.status();
        (status, test::read_body_json(res).await)
    }
}

fn session_cookie(res: &ServiceResponse) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(Cookie::into_owned)
        .expect("session cookie issued")
}

#[actix_web::test]
async fn user_journey_from_registration_to_rated_regeneration() {
    let harness = Harness::new();

    let (status, body) = harness
        .json(test::TestRequest::post().uri("/register").set_json(json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "s3cret"
        })))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let res = harness
        .send(
            test::TestRequest::post()
                .uri("/login")
                .set_json(json!({ "username": "alice", "password": "s3cret" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = session_cookie(&res);

    let (status, _) = harness
        .json(
            test::TestRequest::post()
                .uri("/api/user/preferences")
                .cookie(cookie.clone())
                .set_json(json!({ "preferences": { "style": "smart" } })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, me) = harness
        .json(test::TestRequest::get().uri("/me").cookie(cookie.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        me,
        json!({
            "username": "alice",
            "email": "alice@example.com",
            "preferences": { "style": "smart" },
            "role": "user",
            "provider": "local"
        })
    );

    let (status, forecast) = harness
        .json(test::TestRequest::get().uri("/api/weather?latitude=51.5&longitude=-0.12"))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, outfit) = harness
        .json(
            test::TestRequest::post()
                .uri("/api/chatgpt")
                .cookie(cookie.clone())
                .set_json(json!({ "weatherData": forecast, "date": "2024-05-01" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{outfit}");
    assert_eq!(outfit["imageUrl"], FIXTURE_IMAGE_URL);

    let (status, history) = harness
        .json(test::TestRequest::get().uri("/api/history").cookie(cookie.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    let records = history.as_array().expect("history is an array");
    assert_eq!(records.len(), 1);
    let id = records
        .first()
        .and_then(|record| record["id"].as_i64())
        .expect("record id");
    let prompt: Value = serde_json::from_str(
        records
            .first()
            .and_then(|record| record["prompt"].as_str())
            .expect("prompt text"),
    )
    .expect("prompt is JSON");
    assert_eq!(prompt["userPreferences"], json!({ "style": "smart" }));

    let (status, _) = harness
        .json(
            test::TestRequest::post()
                .uri(&format!("/api/rate/{id}/5"))
                .cookie(cookie.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, regenerated) = harness
        .json(
            test::TestRequest::post()
                .uri("/api/chatgpt/regenerate")
                .cookie(cookie.clone())
                .set_json(json!({ "id": id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{regenerated}");
    assert_eq!(regenerated["generation"]["id"], json!(id));
    assert_eq!(regenerated["generation"]["rating"], json!(5));

    let (status, _) = harness
        .json(test::TestRequest::get().uri("/admin/users").cookie(cookie.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let res = harness
        .send(test::TestRequest::get().uri("/logout").cookie(cookie.clone()))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(harness.sessions.stored(), 0);

    let (status, _) = harness
        .json(test::TestRequest::get().uri("/me").cookie(cookie))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn administrators_manage_regular_accounts() {
    let harness = Harness::new();
    for (name, email) in [("root", "root@example.com"), ("bob", "bob@example.com")] {
        let (status, _) = harness
            .json(test::TestRequest::post().uri("/register").set_json(json!({
                "username": name,
                "email": email,
                "password": "pw"
            })))
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    let root_id = UserId::new(1).expect("first id");
    assert!(harness.store.set_role(root_id, Role::Admin));

    let res = harness
        .send(
            test::TestRequest::post()
                .uri("/login")
                .set_json(json!({ "username": "root", "password": "pw" })),
        )
        .await;
    let cookie = session_cookie(&res);

    let (status, users) = harness
        .json(test::TestRequest::get().uri("/admin/users").cookie(cookie.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().map(Vec::len), Some(1));
    let bob_id = users
        .get(0)
        .and_then(|user| user["id"].as_i64())
        .expect("bob listed");

    let (status, body) = harness
        .json(
            test::TestRequest::delete()
                .uri(&format!("/admin/users/{bob_id}"))
                .cookie(cookie),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted successfully");
}

#[actix_web::test]
async fn errors_carry_a_trace_id() {
    let harness = Harness::new();
    let res = harness.send(test::TestRequest::get().uri("/me")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let header = res
        .headers()
        .get("trace-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .expect("trace-id header");
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["traceId"], json!(header));
}
