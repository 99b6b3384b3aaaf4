//! Domain primitives, services and ports.
//!
//! Purpose: define the strongly typed entities shared by the HTTP and
//! persistence layers, the services that implement the use-cases, and the
//! ports those services depend on. Nothing in here knows about actix, Diesel
//! or reqwest.
//!
//! Public surface:
//! - Error and ErrorCode: transport-agnostic failure payload.
//! - User, Role, AuthProvider, Preferences: account model.
//! - GenerationRecord, Rating, Recommendation: history and outputs.
//! - AccountManager, RecommendationOrchestrator, HistoryLedger: services.

pub mod account_service;
pub mod auth;
pub mod error;
pub mod generation;
pub mod history_service;
pub mod ports;
pub mod recommendation_service;
pub mod trace_id;
pub mod user;
pub mod weather;

pub use self::account_service::{
    ALREADY_EXISTS_MESSAGE, AccountManager, INVALID_CREDENTIALS_MESSAGE,
};
pub use self::auth::{
    FederatedProfile, LoginCredentials, LoginValidationError, PasswordDigest, Registration,
    RegistrationField, RegistrationValidationError,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::generation::{
    Clothes, GenerationContext, GenerationId, GenerationRecord, GenerationValidationError,
    NewGeneration, Rating, Recommendation, RecommendationParseError, StoredContextError,
    strip_code_fence,
};
pub use self::history_service::{GENERATION_NOT_FOUND_MESSAGE, HistoryLedger};
pub use self::recommendation_service::{
    RecommendationOrchestrator, RecommendationPorts, UPSTREAM_FAILURE_MESSAGE, completion_prompt,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{AuthProvider, Preferences, Role, User, UserId, UserValidationError};
pub use self::weather::{CityName, Coordinates, LocationValidationError};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use weatherwear::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
