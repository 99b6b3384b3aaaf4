//! Federated login through OAuth 2.0 identity providers.
//!
//! `GET /auth/{provider}` stores a random `state` in the session and
//! redirects to the provider. `GET /auth/{provider}/callback` checks that
//! state, exchanges the code for a profile and signs the caller in. Every
//! callback outcome ends in a redirect to the front end; failures are only
//! visible in the logs and by the absence of a session.

use actix_web::http::header;
use actix_web::{HttpResponse, get, web};
use rand::distributions::{Alphanumeric, DistString};
use serde::Deserialize;
use tracing::{error, info, warn};
use url::Url;

use crate::domain::{AuthProvider, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

const STATE_LEN: usize = 32;

fn parse_provider(raw: &str) -> Result<AuthProvider, Error> {
    match raw.parse::<AuthProvider>() {
        Ok(provider) if provider.is_federated() => Ok(provider),
        _ => Err(Error::not_found(format!("Unknown identity provider: {raw}"))),
    }
}

fn redirect_to(url: &Url) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, url.as_str()))
        .finish()
}

fn new_state() -> String {
    Alphanumeric.sample_string(&mut rand::thread_rng(), STATE_LEN)
}

/// Start a federated login.
#[utoipa::path(
    get,
    path = "/auth/{provider}",
    params(("provider" = String, Path, description = "`google` or `facebook`")),
    responses(
        (status = 302, description = "Redirect to the identity provider"),
        (status = 404, description = "Unknown provider", body = Error),
        (status = 503, description = "Provider not configured", body = Error)
    ),
    tags = ["auth"],
    operation_id = "startFederatedLogin",
    security([])
)]
#[get("/auth/{provider}")]
pub async fn start_login(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let provider = parse_provider(&path)?;
    let Some(adapter) = state.identity_providers.get(provider) else {
        warn!(%provider, "federated login requested for an unconfigured provider");
        return Ok(HttpResponse::ServiceUnavailable().json(Error::upstream_failure(format!(
            "{provider} login is not available"
        ))));
    };
    let nonce = new_state();
    let url = adapter.authorization_url(&nonce).map_err(|err| {
        error!(%provider, error = %err, "failed to build authorisation url");
        Error::upstream_failure(format!("{provider} login is not available"))
    })?;
    session.remember_oauth_state(provider, &nonce)?;
    Ok(redirect_to(&url))
}

/// Query string the provider sends back to the callback.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Complete a federated login and redirect to the front end.
#[utoipa::path(
    get,
    path = "/auth/{provider}/callback",
    params(
        ("provider" = String, Path, description = "`google` or `facebook`"),
        ("code" = Option<String>, Query, description = "Authorisation code"),
        ("state" = Option<String>, Query, description = "Anti-forgery state"),
        ("error" = Option<String>, Query, description = "Provider error code")
    ),
    responses(
        (status = 302, description = "Redirect to the front end",
            headers(("Set-Cookie" = String, description = "Session cookie on success"))),
        (status = 404, description = "Unknown provider", body = Error)
    ),
    tags = ["auth"],
    operation_id = "federatedLoginCallback",
    security([])
)]
#[get("/auth/{provider}/callback")]
pub async fn callback(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    query: web::Query<CallbackQuery>,
) -> ApiResult<HttpResponse> {
    let provider = parse_provider(&path)?;
    let done = redirect_to(&state.urls.app_url);
    let expected = session.take_oauth_state(provider)?;
    let query = query.into_inner();

    if let Some(reason) = query.error.as_deref() {
        warn!(%provider, error = reason, "identity provider rejected the login");
        return Ok(done);
    }
    let state_matches = matches!(
        (expected.as_deref(), query.state.as_deref()),
        (Some(expected), Some(received)) if expected == received
    );
    if !state_matches {
        warn!(%provider, "oauth state missing or mismatched");
        return Ok(done);
    }
    let Some(code) = query.code.as_deref().filter(|code| !code.is_empty()) else {
        warn!(%provider, "oauth callback without a code");
        return Ok(done);
    };
    let Some(adapter) = state.identity_providers.get(provider) else {
        warn!(%provider, "oauth callback for an unconfigured provider");
        return Ok(done);
    };

    let profile = match adapter.exchange_code(code).await {
        Ok(profile) => profile,
        Err(err) => {
            warn!(%provider, error = %err, "oauth code exchange failed");
            return Ok(done);
        }
    };
    match state.accounts.authenticate_federated(&profile).await {
        Ok(user) => {
            session.persist_user(user.id)?;
            info!(%provider, user_id = %user.id, "federated login succeeded");
        }
        Err(err) => {
            warn!(%provider, error = %err, "federated account lookup failed");
        }
    }
    Ok(done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::IdentityProviders;
    use crate::inbound::http::test_utils::{TEST_APP_URL, TestWorld, session_cookie};
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::Value;

    fn location<B>(res: &actix_web::dev::ServiceResponse<B>) -> String {
        res.headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .expect("location header")
            .to_owned()
    }

    /// Start a login and return the issued state and session cookie.
    async fn begin(world: &TestWorld, provider: &str) -> (String, Cookie<'static>) {
        let app = test::init_service(world.app()).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/auth/{provider}"))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FOUND);
        let url = Url::parse(&location(&res)).expect("absolute redirect");
        let state = url
            .query_pairs()
            .find(|(key, _)| key == "state")
            .map(|(_, value)| value.into_owned())
            .expect("state parameter");
        let cookie = session_cookie(&res).expect("state stored in session");
        (state, cookie)
    }

    async fn finish(
        world: &TestWorld,
        provider: &str,
        query: &str,
        cookie: Cookie<'static>,
    ) -> actix_web::dev::ServiceResponse {
        let app = test::init_service(world.app()).await;
        test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/auth/{provider}/callback?{query}"))
                .cookie(cookie)
                .to_request(),
        )
        .await
        .map_into_boxed_body()
    }

    async fn me(world: &TestWorld, cookie: Cookie<'static>) -> (StatusCode, Value) {
        let app = test::init_service(world.app()).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/me").cookie(cookie).to_request(),
        )
        .await;
        let status = res.status();
        (status, test::read_body_json(res).await)
    }

    #[rstest]
    #[case("google")]
    #[case("facebook")]
    #[actix_web::test]
    async fn successful_callback_signs_the_caller_in(#[case] provider: &str) {
        let world = TestWorld::new();
        let (state, cookie) = begin(&world, provider).await;
        assert_eq!(state.len(), STATE_LEN);

        let res = finish(&world, provider, &format!("code=abc&state={state}"), cookie).await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(location(&res), TEST_APP_URL);
        let cookie = session_cookie(&res).expect("session established");

        let (status, body) = me(&world, cookie).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "Fixture abc");
        assert_eq!(body["provider"], provider);
    }

    #[rstest]
    #[case("code=abc&state=forged")]
    #[case("code=abc")]
    #[case("error=access_denied")]
    #[case("state={state}")]
    #[actix_web::test]
    async fn failed_callbacks_redirect_without_a_session(#[case] template: &str) {
        let world = TestWorld::new();
        let (state, cookie) = begin(&world, "google").await;
        let query = template.replace("{state}", &state);

        let res = finish(&world, "google", &query, cookie).await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(location(&res), TEST_APP_URL);
        if let Some(cookie) = session_cookie(&res) {
            let (status, _) = me(&world, cookie).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
    }

    #[rstest]
    #[case("/auth/local")]
    #[case("/auth/github")]
    #[case("/auth/github/callback")]
    #[actix_web::test]
    async fn unknown_providers_are_not_found(#[case] uri: &str) {
        let world = TestWorld::new();
        let app = test::init_service(world.app()).await;
        let res = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn unconfigured_providers_are_unavailable() {
        let world = TestWorld::customised(|ports| {
            ports.identity_providers = IdentityProviders::new();
        });
        let app = test::init_service(world.app()).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/auth/google").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["code"], "upstream_failure");
    }
}
