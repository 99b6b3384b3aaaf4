//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects every HTTP endpoint and the request and response
//! bodies they use, plus the session cookie security scheme. The document is
//! served by Swagger UI in debug builds and printed by
//! `cargo run --bin openapi-dump`.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{
    AuthProvider, Clothes, Coordinates, Error, ErrorCode, GenerationRecord, Recommendation, Role,
};
use crate::inbound::http::history::SaveHistoryRequest;
use crate::inbound::http::preferences::PreferencesRequest;
use crate::inbound::http::recommendations::{
    RecommendationBody, RecommendationResponse, RegenerateBody, RegenerationResponse,
};
use crate::inbound::http::schemas::{
    CurrentUserResponse, LoginResponse, MessageResponse, UserSummary,
};
use crate::inbound::http::session_config::SESSION_COOKIE_NAME;
use crate::inbound::http::users::{LoginRequest, RegisterRequest};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                SESSION_COOKIE_NAME,
                "Session cookie issued by POST /login or a federated login callback.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "WeatherWear API",
        description = "Weather-based outfit recommendations with local and federated accounts."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::current_user,
        crate::inbound::http::oauth::start_login,
        crate::inbound::http::oauth::callback,
        crate::inbound::http::weather::forecast,
        crate::inbound::http::weather::city,
        crate::inbound::http::recommendations::recommend,
        crate::inbound::http::recommendations::regenerate,
        crate::inbound::http::history::save_history,
        crate::inbound::http::history::list_history,
        crate::inbound::http::history::rate_generation,
        crate::inbound::http::preferences::update_preferences,
        crate::inbound::http::admin::list_users,
        crate::inbound::http::admin::delete_user,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        Role,
        AuthProvider,
        Coordinates,
        Clothes,
        Recommendation,
        GenerationRecord,
        MessageResponse,
        LoginResponse,
        CurrentUserResponse,
        UserSummary,
        RegisterRequest,
        LoginRequest,
        RecommendationBody,
        RecommendationResponse,
        RegenerateBody,
        RegenerationResponse,
        SaveHistoryRequest,
        PreferencesRequest,
    )),
    tags(
        (name = "users", description = "Registration, login and the caller's profile"),
        (name = "auth", description = "Federated login through OAuth providers"),
        (name = "weather", description = "Forecast and geocoding proxies"),
        (name = "recommendations", description = "Outfit recommendations"),
        (name = "history", description = "Recommendation history and ratings"),
        (name = "admin", description = "User management for administrators"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
