//! Account endpoints: registration, local login, logout and the current
//! user.
//!
//! ```text
//! POST /register {"username":"alice","email":"a@x.com","password":"pw"}
//! POST /login {"username":"alice","password":"pw"}
//! GET /logout
//! GET /me
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{
    Error, LoginCredentials, LoginValidationError, Registration, RegistrationValidationError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::guards::AuthenticatedUser;
use crate::inbound::http::schemas::{CurrentUserResponse, LoginResponse, MessageResponse};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{ValidationCode, field_error};

/// Message for a registration with a blank or missing field.
pub const ALL_FIELDS_REQUIRED_MESSAGE: &str = "All fields are required";

/// Registration request body for `POST /register`.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Login request body for `POST /login`.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn map_registration_error(err: RegistrationValidationError) -> Error {
    match err {
        RegistrationValidationError::MissingField(field) => field_error(
            field.as_str(),
            ALL_FIELDS_REQUIRED_MESSAGE,
            ValidationCode::MissingField,
        ),
        RegistrationValidationError::MalformedEmail => field_error(
            "email",
            "Email address is malformed",
            ValidationCode::InvalidValue,
        ),
    }
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    let field = match err {
        LoginValidationError::EmptyUsername => "username",
        LoginValidationError::EmptyPassword => "password",
    };
    field_error(field, err.to_string(), ValidationCode::MissingField)
}

/// Create a local account. No session is established.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = MessageResponse),
        (status = 400, description = "Missing field or account already exists", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<web::Json<MessageResponse>> {
    let RegisterRequest {
        username,
        email,
        password,
    } = payload.into_inner();
    let registration =
        Registration::try_from_parts(username.as_deref(), email.as_deref(), password.as_deref())
            .map_err(map_registration_error)?;
    state.accounts.register(&registration).await?;
    Ok(web::Json(MessageResponse::new("User registered successfully")))
}

/// Authenticate with a username and password and establish a session.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = LoginResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Incorrect username or password", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let credentials = LoginCredentials::try_from_parts(&payload.username, &payload.password)
        .map_err(map_login_validation_error)?;
    let user = state.accounts.authenticate_local(&credentials).await?;
    session.persist_user(user.id)?;
    info!(user_id = %user.id, "local login succeeded");
    Ok(web::Json(LoginResponse::from(&user)))
}

/// Destroy the caller's session.
#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "No session", body = Error)
    ),
    tags = ["users"],
    operation_id = "logout"
)]
#[get("/logout")]
pub async fn logout(caller: AuthenticatedUser) -> HttpResponse {
    caller.session.purge();
    info!(user_id = %caller.user.id, "logged out");
    HttpResponse::Ok().json(MessageResponse::new("Logged out successfully"))
}

/// Profile of the signed-in caller.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Current user", body = CurrentUserResponse),
        (status = 401, description = "No session", body = Error)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/me")]
pub async fn current_user(caller: AuthenticatedUser) -> web::Json<CurrentUserResponse> {
    web::Json(CurrentUserResponse::from(caller.user))
}
